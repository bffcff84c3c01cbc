//! Employee, store and back-office account records.
//!
//! The ledger only sees the read-only [`Directory`] port. HTTP handlers that
//! manage records use [`DirectoryAdmin`].

mod memory;
mod mysql;

pub use memory::InMemoryDirectory;
pub use mysql::MySqlDirectory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::employee::{Employee, EmployeeAccount, EmployeeChanges, NewEmployee};
use crate::model::store::{NewStore, Store, StoreChanges};
use crate::model::user::User;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Unique column (employee code, username, ...) already taken.
    #[error("record already exists")]
    AlreadyExists,

    /// Referenced row (e.g. the employee's store) does not exist.
    #[error("related record not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return Self::AlreadyExists;
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference;
            }
        }
        Self::Sql(error)
    }
}

/// Lookups the attendance ledger depends on.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_employee(&self, id: &str) -> Result<Option<Employee>, DirectoryError>;

    async fn get_store(&self, id: &str) -> Result<Option<Store>, DirectoryError>;

    /// All stores ordered by name.
    async fn list_stores(&self) -> Result<Vec<Store>, DirectoryError>;
}

/// Record management and credential lookups.
#[async_trait]
pub trait DirectoryAdmin: Directory {
    /// All employees ordered by name.
    async fn list_employees(&self) -> Result<Vec<Employee>, DirectoryError>;

    async fn list_employees_by_store(&self, store_id: &str) -> Result<Vec<Employee>, DirectoryError>;

    async fn find_employee_by_code(&self, code: &str) -> Result<Option<EmployeeAccount>, DirectoryError>;

    async fn get_employee_account(&self, id: &str) -> Result<Option<EmployeeAccount>, DirectoryError>;

    async fn add_employee(&self, employee: NewEmployee) -> Result<Employee, DirectoryError>;

    /// `None` when the employee does not exist.
    async fn update_employee(
        &self,
        id: &str,
        changes: EmployeeChanges,
    ) -> Result<Option<Employee>, DirectoryError>;

    /// `false` when the employee does not exist.
    async fn set_employee_password(&self, id: &str, password_hash: &str) -> Result<bool, DirectoryError>;

    /// `false` when the employee does not exist.
    async fn delete_employee(&self, id: &str) -> Result<bool, DirectoryError>;

    async fn add_store(&self, store: NewStore) -> Result<Store, DirectoryError>;

    async fn update_store(&self, id: &str, changes: StoreChanges) -> Result<Option<Store>, DirectoryError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;
}
