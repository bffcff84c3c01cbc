use serde::{Deserialize, Serialize};

/// Back-office account (administrators). Employees log in with their
/// employee code instead.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub name: String,
    pub email: String,
}
