//! Projection of instants onto the organisation's wall clock.
//!
//! Every store partitions attendance by the calendar day in
//! America/Santo_Domingo, whatever the host or caller time zone is.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::{America::Santo_Domingo, Tz};

pub const ATTENDANCE_TZ: Tz = Santo_Domingo;

const DISPLAY_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStamp {
    pub date: NaiveDate,
    pub time: String,
}

pub fn local_stamp(at: DateTime<Utc>) -> LocalStamp {
    let local = at.with_timezone(&ATTENDANCE_TZ);
    LocalStamp {
        date: local.date_naive(),
        time: local.format(DISPLAY_TIME_FORMAT).to_string(),
    }
}
