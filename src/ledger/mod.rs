//! Attendance ledger: punch admission and attendance aggregates.

pub mod clock;
mod mysql;
mod service;
pub mod stats;
mod store;

pub use mysql::MySqlPunchStore;
pub use service::{Ledger, LedgerError, parse_punch_type};
pub use stats::{DEFAULT_RANKING_LIMIT, StoreStats};
pub use store::{InMemoryPunchStore, PunchFilter, PunchStore, StoreError};
