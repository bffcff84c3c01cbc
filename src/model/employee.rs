use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "0d9f1c52-3b7e-4a0e-8f0e-6f5b7e0a2c11",
        "employeeCode": "EMP-001",
        "name": "Juan Pérez",
        "storeId": "store-1",
        "position": "Cajero",
        "phone": "809-555-0101",
        "email": "juan@empresa.com",
        "active": true,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    pub id: String,

    /// Login name of the employee, unique across the organisation
    #[schema(example = "EMP-001")]
    pub employee_code: String,

    pub name: String,

    #[schema(example = "store-1")]
    pub store_id: String,

    #[schema(example = "Empleado")]
    pub position: String,

    pub phone: String,

    pub email: String,

    pub active: bool,

    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Employee row together with its password hash. Never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeAccount {
    #[sqlx(flatten)]
    pub employee: Employee,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub id: String,
    pub employee_code: String,
    pub name: String,
    pub store_id: String,
    pub position: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}
