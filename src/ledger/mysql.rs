use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::store::{PunchFilter, PunchStore, StoreError};
use crate::model::punch::{Punch, PunchType};

const INSERT_PUNCH_SQL: &str = r#"
    INSERT INTO punches
        (id, employee_id, store_id, punch_type, punch_date, punch_time, punched_at, daily_slot)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(FromRow)]
struct PunchRow {
    id: String,
    employee_id: String,
    store_id: String,
    punch_type: String,
    punch_date: NaiveDate,
    punch_time: String,
    punched_at: DateTime<Utc>,
}

impl TryFrom<PunchRow> for Punch {
    type Error = StoreError;

    fn try_from(row: PunchRow) -> Result<Self, Self::Error> {
        let kind = PunchType::from_str(&row.punch_type)
            .map_err(|_| StoreError::Corrupt(format!("punch {} has type {:?}", row.id, row.punch_type)))?;

        Ok(Punch {
            id: row.id,
            employee_id: row.employee_id,
            store_id: row.store_id,
            kind,
            timestamp: row.punched_at,
            date: row.punch_date,
            time: row.punch_time,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
    Date(NaiveDate),
}

/// Builds the filtered SELECT. Rows come back oldest first, the same order
/// the memory store keeps, so first-encountered tie-breaks agree.
fn select_punches_sql(filter: &PunchFilter) -> (String, Vec<FilterValue<'_>>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue<'_>> = Vec::new();

    if let Some(date) = filter.date {
        where_sql.push_str(" AND punch_date = ?");
        args.push(FilterValue::Date(date));
    }

    if let Some(store_id) = filter.store_id.as_deref() {
        where_sql.push_str(" AND store_id = ?");
        args.push(FilterValue::Str(store_id));
    }

    if let Some(employee_id) = filter.employee_id.as_deref() {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::Str(employee_id));
    }

    if let Some(kind) = filter.kind {
        where_sql.push_str(" AND punch_type = ?");
        args.push(FilterValue::Str(kind.as_str()));
    }

    let sql = format!(
        r#"
        SELECT id, employee_id, store_id, punch_type, punch_date, punch_time, punched_at
        FROM punches
        {}
        ORDER BY punched_at ASC
        "#,
        where_sql
    );

    (sql, args)
}

/// MySQL-backed ledger. The `uq_punches_daily_slot` unique index on
/// `(employee_id, punch_date, daily_slot)` is what actually guarantees one
/// restricted punch per type per day; `daily_slot` is NULL for bathroom
/// punches so they never collide.
#[derive(Debug, Clone)]
pub struct MySqlPunchStore {
    pool: MySqlPool,
}

impl MySqlPunchStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PunchStore for MySqlPunchStore {
    async fn append(&self, punch: Punch) -> Result<(), StoreError> {
        let result = sqlx::query(INSERT_PUNCH_SQL)
            .bind(&punch.id)
            .bind(&punch.employee_id)
            .bind(&punch.store_id)
            .bind(punch.kind.as_str())
            .bind(punch.date)
            .bind(&punch.time)
            .bind(punch.timestamp)
            .bind(punch.daily_slot())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Err(StoreError::DuplicateDailyPunch);
                    }
                }
                Err(StoreError::Sql(e))
            }
        }
    }

    async fn query(&self, filter: &PunchFilter) -> Result<Vec<Punch>, StoreError> {
        let (sql, args) = select_punches_sql(filter);
        debug!(sql = %sql, ?filter, "Querying punches");

        let mut query = sqlx::query_as::<_, PunchRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(StoreError::Sql)?;
        rows.into_iter().map(Punch::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_binds_only_given_filters_oldest_first() {
        let filter = PunchFilter {
            date: NaiveDate::from_ymd_opt(2024, 1, 10),
            kind: Some(PunchType::BathroomOut),
            ..Default::default()
        };

        let (sql, args) = select_punches_sql(&filter);

        assert!(sql.contains("WHERE 1=1 AND punch_date = ? AND punch_type = ?"));
        assert!(!sql.contains("store_id = ?"));
        assert!(sql.trim_end().ends_with("ORDER BY punched_at ASC"));
        assert!(matches!(
            args.as_slice(),
            [FilterValue::Date(_), FilterValue::Str("bathroom-out")]
        ));
    }

    #[test]
    fn empty_filter_selects_everything() {
        let filter = PunchFilter::default();
        let (sql, args) = select_punches_sql(&filter);
        assert!(sql.contains("WHERE 1=1\n"));
        assert!(args.is_empty());
    }
}
