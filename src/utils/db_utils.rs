use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Bool(bool),
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// ===============================
/// Partial UPDATE builder
/// ===============================
/// Only columns given a value end up in the SET clause. Column names are
/// always compile-time constants, values are always bound.
#[derive(Debug)]
pub struct SqlUpdate {
    table: &'static str,
    id_column: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
    touch: Option<&'static str>,
}

impl SqlUpdate {
    pub fn new(table: &'static str, id_column: &'static str) -> Self {
        Self {
            table,
            id_column,
            assignments: Vec::new(),
            touch: None,
        }
    }

    pub fn set<V: Into<SqlValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    /// Column set to `CURRENT_TIMESTAMP` whenever something else changes.
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touch = Some(column);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn to_sql(&self) -> String {
        let mut set_clause: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect();

        if let Some(column) = self.touch {
            set_clause.push(format!("{} = CURRENT_TIMESTAMP", column));
        }

        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table,
            set_clause.join(", "),
            self.id_column
        )
    }

    /// Runs the update. A builder with nothing to set is a no-op.
    pub async fn execute(self, pool: &MySqlPool, id: &str) -> Result<u64, sqlx::Error> {
        if self.is_empty() {
            return Ok(0);
        }

        let sql = self.to_sql();
        let mut query = sqlx::query(&sql);

        for (_, value) in self.assignments {
            query = match value {
                SqlValue::String(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
            };
        }

        let result = query.bind(id).execute(pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_absent_values() {
        let update = SqlUpdate::new("employees", "id")
            .set("name", Some("Ana".to_string()))
            .set::<String>("phone", None)
            .set("active", Some(false))
            .touch("updated_at");

        assert_eq!(
            update.to_sql(),
            "UPDATE employees SET name = ?, active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?"
        );
    }

    #[test]
    fn empty_update_is_detected() {
        let update = SqlUpdate::new("stores", "id").set::<String>("name", None);
        assert!(update.is_empty());
    }
}
