use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "store-1",
    "name": "Tienda Centro",
    "address": "Av. Principal #100",
    "createdAt": "2024-01-01T00:00:00Z"
}))]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub address: Option<String>,
}
