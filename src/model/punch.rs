use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Kind of attendance event. Wire values are the kebab-case names
/// (`in`, `out`, `lunch-out`, `lunch-in`, `bathroom-out`, `bathroom-in`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PunchType {
    In,
    Out,
    LunchOut,
    LunchIn,
    BathroomOut,
    BathroomIn,
}

impl PunchType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Restricted kinds may be registered at most once per employee per day.
    pub fn is_restricted(self) -> bool {
        !matches!(self, PunchType::BathroomOut | PunchType::BathroomIn)
    }

    /// User-facing (Spanish) name used in conflict messages.
    pub fn label(self) -> &'static str {
        match self {
            PunchType::In => "entrada",
            PunchType::Out => "salida",
            PunchType::LunchOut => "salida de almuerzo",
            PunchType::LunchIn => "entrada de almuerzo",
            PunchType::BathroomOut => "salida al baño",
            PunchType::BathroomIn => "regreso del baño",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "7b1c9d4e-0f55-4a8e-9d43-2f0d3c1b8a11",
    "employeeId": "e-100",
    "storeId": "store-1",
    "type": "in",
    "timestamp": "2024-01-10T12:00:00Z",
    "date": "2024-01-10",
    "time": "08:00"
}))]
pub struct Punch {
    pub id: String,
    pub employee_id: String,
    /// Store of the employee at the moment of the punch
    pub store_id: String,
    #[serde(rename = "type")]
    pub kind: PunchType,
    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,
    /// Santo Domingo calendar date of `timestamp`
    #[schema(value_type = String)]
    pub date: NaiveDate,
    pub time: String,
}

impl Punch {
    /// Value of the storage-level uniqueness slot: the kind for restricted
    /// punches, nothing for bathroom breaks.
    pub fn daily_slot(&self) -> Option<&'static str> {
        self.kind.is_restricted().then(|| self.kind.as_str())
    }
}

/// Punch plus display names resolved from the directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPunch {
    #[serde(flatten)]
    pub punch: Punch,
    pub employee_name: String,
    pub store_name: String,
}
