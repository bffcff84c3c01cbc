//! Storage port of the attendance ledger.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::model::punch::{Punch, PunchType};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A restricted punch already occupies `(employee, date, type)`.
    #[error("duplicate daily punch")]
    DuplicateDailyPunch,

    #[error("stored punch is malformed: {0}")]
    Corrupt(String),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

/// Conjunction of optional criteria. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PunchFilter {
    pub date: Option<NaiveDate>,
    pub store_id: Option<String>,
    pub employee_id: Option<String>,
    pub kind: Option<PunchType>,
}

impl PunchFilter {
    pub fn matches(&self, punch: &Punch) -> bool {
        self.date.is_none_or(|d| punch.date == d)
            && self.store_id.as_deref().is_none_or(|s| punch.store_id == s)
            && self.employee_id.as_deref().is_none_or(|e| punch.employee_id == e)
            && self.kind.is_none_or(|k| punch.kind == k)
    }
}

/// Append-only punch storage.
///
/// `append` must reject a second restricted punch for the same
/// `(employee_id, date, kind)` atomically with `DuplicateDailyPunch`.
/// `query` returns matches oldest first.
#[async_trait]
pub trait PunchStore: Send + Sync {
    async fn append(&self, punch: Punch) -> Result<(), StoreError>;

    async fn query(&self, filter: &PunchFilter) -> Result<Vec<Punch>, StoreError>;
}

/// Process-local store. Insertion order is the natural order.
#[derive(Debug, Default)]
pub struct InMemoryPunchStore {
    punches: RwLock<Vec<Punch>>,
}

impl InMemoryPunchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PunchStore for InMemoryPunchStore {
    async fn append(&self, punch: Punch) -> Result<(), StoreError> {
        let mut punches = self.punches.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(slot) = punch.daily_slot() {
            let taken = punches.iter().any(|p| {
                p.employee_id == punch.employee_id && p.date == punch.date && p.daily_slot() == Some(slot)
            });
            if taken {
                return Err(StoreError::DuplicateDailyPunch);
            }
        }

        punches.push(punch);
        Ok(())
    }

    async fn query(&self, filter: &PunchFilter) -> Result<Vec<Punch>, StoreError> {
        let punches = self.punches.read().unwrap_or_else(PoisonError::into_inner);
        Ok(punches.iter().filter(|p| filter.matches(p)).cloned().collect())
    }
}
