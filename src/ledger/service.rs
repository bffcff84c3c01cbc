use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::clock::local_stamp;
use super::stats::{BathroomTally, StoreStats, rank_bathroom_breaks, store_stats};
use super::store::{PunchFilter, PunchStore, StoreError};
use crate::directory::{Directory, DirectoryError};
use crate::model::punch::{Punch, PunchType};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unrecognised punch type {0:?}")]
    InvalidPunchType(String),

    #[error("employee {0} not found")]
    EmployeeNotFound(String),

    #[error("employee {0} is inactive")]
    EmployeeInactive(String),

    /// Restricted kind already registered today; `time` is the display
    /// time of the existing punch.
    #[error("{kind} already registered today at {time}")]
    AlreadyPunched { kind: PunchType, time: String },

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Parses a wire punch type (`in`, `lunch-out`, ...).
pub fn parse_punch_type(raw: &str) -> Result<PunchType, LedgerError> {
    raw.parse()
        .map_err(|_| LedgerError::InvalidPunchType(raw.to_string()))
}

/// Attendance ledger: admission control for new punches and the read side
/// used by the dashboards.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn PunchStore>,
    directory: Arc<dyn Directory>,
}

impl Ledger {
    pub fn new(store: Arc<dyn PunchStore>, directory: Arc<dyn Directory>) -> Self {
        Self { store, directory }
    }

    pub async fn register_punch(&self, employee_id: &str, kind: PunchType) -> Result<Punch, LedgerError> {
        self.register_punch_at(employee_id, kind, Utc::now()).await
    }

    /// Registers a punch as if it happened at `at`.
    #[instrument(name = "register_punch", skip(self))]
    pub async fn register_punch_at(
        &self,
        employee_id: &str,
        kind: PunchType,
        at: DateTime<Utc>,
    ) -> Result<Punch, LedgerError> {
        let employee = self
            .directory
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| LedgerError::EmployeeNotFound(employee_id.to_string()))?;

        if !employee.is_active() {
            info!("Punch rejected: employee inactive");
            return Err(LedgerError::EmployeeInactive(employee.id));
        }

        let stamp = local_stamp(at);
        let punch = Punch {
            id: Uuid::new_v4().to_string(),
            employee_id: employee.id,
            store_id: employee.store_id,
            kind,
            timestamp: at,
            date: stamp.date,
            time: stamp.time,
        };

        if kind.is_restricted() {
            if let Some(existing) = self.same_day_punch(&punch).await? {
                info!(date = %punch.date, existing = %existing.time, "Punch rejected: already registered");
                return Err(LedgerError::AlreadyPunched {
                    kind,
                    time: existing.time,
                });
            }
        }

        match self.store.append(punch.clone()).await {
            Ok(()) => {
                debug!(punch_id = %punch.id, date = %punch.date, "Punch registered");
                Ok(punch)
            }
            Err(StoreError::DuplicateDailyPunch) => {
                // lost a race against a concurrent request for the same slot
                warn!(date = %punch.date, "Concurrent duplicate punch rejected by storage");
                let time = self
                    .same_day_punch(&punch)
                    .await?
                    .map_or(punch.time, |existing| existing.time);
                Err(LedgerError::AlreadyPunched { kind, time })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn same_day_punch(&self, punch: &Punch) -> Result<Option<Punch>, LedgerError> {
        let filter = PunchFilter {
            date: Some(punch.date),
            employee_id: Some(punch.employee_id.clone()),
            kind: Some(punch.kind),
            ..Default::default()
        };
        Ok(self.store.query(&filter).await?.into_iter().next())
    }

    pub async fn list_punches(&self, filter: &PunchFilter) -> Result<Vec<Punch>, LedgerError> {
        Ok(self.store.query(filter).await?)
    }

    /// The employee's own punches, newest first.
    pub async fn employee_history(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Punch>, LedgerError> {
        let filter = PunchFilter {
            date,
            employee_id: Some(employee_id.to_string()),
            ..Default::default()
        };

        let mut punches = self.store.query(&filter).await?;
        punches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(punches)
    }

    pub async fn stats_by_store(&self, date: Option<NaiveDate>) -> Result<Vec<StoreStats>, LedgerError> {
        let stores = self.directory.list_stores().await?;
        let filter = PunchFilter {
            date,
            ..Default::default()
        };
        let punches = self.store.query(&filter).await?;

        Ok(store_stats(&stores, &punches))
    }

    pub async fn top_bathroom_offenders(&self, limit: usize) -> Result<Vec<BathroomTally>, LedgerError> {
        let filter = PunchFilter {
            kind: Some(PunchType::BathroomOut),
            ..Default::default()
        };
        let punches = self.store.query(&filter).await?;

        Ok(rank_bathroom_breaks(&punches, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryAdmin, InMemoryDirectory};
    use crate::ledger::store::InMemoryPunchStore;
    use crate::model::employee::{EmployeeChanges, NewEmployee};
    use crate::model::store::NewStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose next query can be made to miss, standing in for a
    /// concurrent request that appends between the pre-check and the write.
    #[derive(Default)]
    struct RacingStore {
        inner: InMemoryPunchStore,
        hide_next_query: AtomicBool,
    }

    #[async_trait]
    impl PunchStore for RacingStore {
        async fn append(&self, punch: Punch) -> Result<(), StoreError> {
            self.inner.append(punch).await
        }

        async fn query(&self, filter: &PunchFilter) -> Result<Vec<Punch>, StoreError> {
            if self.hide_next_query.swap(false, Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.query(filter).await
        }
    }

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    async fn setup() -> (Ledger, Arc<InMemoryDirectory>) {
        setup_with(Arc::new(InMemoryPunchStore::new())).await
    }

    async fn setup_with(store: Arc<dyn PunchStore>) -> (Ledger, Arc<InMemoryDirectory>) {
        let directory = Arc::new(InMemoryDirectory::new());
        for (id, name) in [("S", "Tienda S"), ("T", "Tienda T")] {
            directory.insert_store(NewStore {
                id: id.into(),
                name: name.into(),
                address: String::new(),
            });
        }
        directory
            .add_employee(NewEmployee {
                id: "E".into(),
                employee_code: "E-001".into(),
                name: "Empleado E".into(),
                store_id: "S".into(),
                position: "Empleado".into(),
                phone: String::new(),
                email: String::new(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let ledger = Ledger::new(store, directory.clone());
        (ledger, directory)
    }

    #[actix_web::test]
    async fn second_restricted_punch_same_day_conflicts() {
        let (ledger, _) = setup().await;

        let first = ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T12:00:00Z"))
            .await
            .unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(first.time, "08:00");
        assert_eq!(first.store_id, "S");

        let err = ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T16:45:00Z"))
            .await
            .unwrap_err();
        match err {
            LedgerError::AlreadyPunched { kind, time } => {
                assert_eq!(kind, PunchType::In);
                assert_eq!(time, "08:00");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn storage_duplicate_reports_the_existing_punch() {
        let store = Arc::new(RacingStore::default());
        let (ledger, _) = setup_with(store.clone()).await;

        ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T12:00:00Z"))
            .await
            .unwrap();

        // the pre-check sees nothing, so only the storage key can refuse it
        store.hide_next_query.store(true, Ordering::SeqCst);
        let err = ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T12:00:01Z"))
            .await
            .unwrap_err();
        match err {
            LedgerError::AlreadyPunched { kind, time } => {
                assert_eq!(kind, PunchType::In);
                assert_eq!(time, "08:00");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = store.inner.query(&PunchFilter::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].timestamp, at("2024-01-10T12:00:00Z"));
    }

    #[actix_web::test]
    async fn restricted_kinds_are_independent_and_reset_daily() {
        let (ledger, _) = setup().await;

        for kind in [PunchType::In, PunchType::LunchOut, PunchType::LunchIn, PunchType::Out] {
            ledger
                .register_punch_at("E", kind, at("2024-01-10T13:00:00Z"))
                .await
                .unwrap();
        }

        // next Santo Domingo day
        ledger
            .register_punch_at("E", PunchType::In, at("2024-01-11T12:00:00Z"))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn late_night_utc_counts_for_previous_local_day() {
        let (ledger, _) = setup().await;

        ledger
            .register_punch_at("E", PunchType::Out, at("2024-01-11T01:30:00Z"))
            .await
            .unwrap();

        let err = ledger
            .register_punch_at("E", PunchType::Out, at("2024-01-10T22:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyPunched { .. }));
    }

    #[actix_web::test]
    async fn bathroom_breaks_are_unlimited_and_ranked() {
        let (ledger, _) = setup().await;

        for minute in 0..3 {
            ledger
                .register_punch_at(
                    "E",
                    PunchType::BathroomOut,
                    at(&format!("2024-01-10T14:0{minute}:00Z")),
                )
                .await
                .unwrap();
        }

        let ranking = ledger.top_bathroom_offenders(10).await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].employee_id, "E");
        assert_eq!(ranking[0].count, 3);
    }

    #[actix_web::test]
    async fn ranking_ties_go_to_the_earliest_punch() {
        let (ledger, directory) = setup().await;
        directory
            .add_employee(NewEmployee {
                id: "F".into(),
                employee_code: "F-001".into(),
                name: "Empleado F".into(),
                store_id: "T".into(),
                position: "Empleado".into(),
                phone: String::new(),
                email: String::new(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        for (employee, when) in [("F", "2024-01-10T14:00:00Z"), ("E", "2024-01-10T15:00:00Z")] {
            ledger
                .register_punch_at(employee, PunchType::BathroomOut, at(when))
                .await
                .unwrap();
        }

        let ranking = ledger.top_bathroom_offenders(10).await.unwrap();
        let order: Vec<_> = ranking.iter().map(|t| (t.employee_id.as_str(), t.store_id.as_str())).collect();
        assert_eq!(order, [("F", "T"), ("E", "S")]);
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let (ledger, _) = setup().await;

        let err = ledger.register_punch("nobody", PunchType::In).await.unwrap_err();
        assert!(matches!(err, LedgerError::EmployeeNotFound(_)));
    }

    #[actix_web::test]
    async fn inactive_employee_is_rejected_for_every_kind() {
        let (ledger, directory) = setup().await;
        directory
            .update_employee(
                "E",
                EmployeeChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        for kind in [PunchType::In, PunchType::BathroomOut, PunchType::BathroomIn] {
            let err = ledger.register_punch("E", kind).await.unwrap_err();
            assert!(matches!(err, LedgerError::EmployeeInactive(_)));
        }
        assert!(ledger.list_punches(&PunchFilter::default()).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn stats_by_store_include_empty_stores() {
        let (ledger, _) = setup().await;
        ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T12:00:00Z"))
            .await
            .unwrap();
        ledger
            .register_punch_at("E", PunchType::BathroomOut, at("2024-01-10T14:00:00Z"))
            .await
            .unwrap();

        let stats = ledger
            .stats_by_store(NaiveDate::from_ymd_opt(2024, 1, 10))
            .await
            .unwrap();

        assert_eq!(stats.len(), 2);
        let s = stats.iter().find(|s| s.store_id == "S").unwrap();
        assert_eq!((s.total_punches, s.unique_employees, s.punches_in, s.punches_out), (2, 1, 1, 0));
        let t = stats.iter().find(|s| s.store_id == "T").unwrap();
        assert_eq!((t.total_punches, t.unique_employees, t.punches_in, t.punches_out), (0, 0, 0, 0));

        let other_day = ledger
            .stats_by_store(NaiveDate::from_ymd_opt(2024, 1, 11))
            .await
            .unwrap();
        assert!(other_day.iter().all(|s| s.total_punches == 0));
    }

    #[actix_web::test]
    async fn history_is_newest_first() {
        let (ledger, _) = setup().await;
        ledger
            .register_punch_at("E", PunchType::In, at("2024-01-10T12:00:00Z"))
            .await
            .unwrap();
        ledger
            .register_punch_at("E", PunchType::Out, at("2024-01-10T21:00:00Z"))
            .await
            .unwrap();
        ledger
            .register_punch_at("E", PunchType::In, at("2024-01-11T12:00:00Z"))
            .await
            .unwrap();

        let all = ledger.employee_history("E", None).await.unwrap();
        let kinds: Vec<_> = all.iter().map(|p| (p.date.to_string(), p.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("2024-01-11".to_string(), PunchType::In),
                ("2024-01-10".to_string(), PunchType::Out),
                ("2024-01-10".to_string(), PunchType::In),
            ]
        );

        let one_day = ledger
            .employee_history("E", NaiveDate::from_ymd_opt(2024, 1, 10))
            .await
            .unwrap();
        assert_eq!(one_day.len(), 2);
    }

    #[test]
    fn parses_only_known_types() {
        assert_eq!(parse_punch_type("bathroom-in").unwrap(), PunchType::BathroomIn);
        assert!(matches!(
            parse_punch_type("coffee"),
            Err(LedgerError::InvalidPunchType(raw)) if raw == "coffee"
        ));
    }
}
