use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use super::leave_request::LeaveType;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Hadir,
    Izin,
    Sakit,
    Alpha,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl From<LeaveType> for AttendanceStatus {
    fn from(value: LeaveType) -> Self {
        match value {
            LeaveType::Izin => AttendanceStatus::Izin,
            LeaveType::Sakit => AttendanceStatus::Sakit,
        }
    }
}

/// Where an attendance row came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceSource {
    #[serde(rename = "self")]
    #[strum(serialize = "self")]
    SelfCheckIn,
    Permission,
    System,
}

impl AttendanceSource {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "2025-01-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[schema(example = "07:12:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "14:03:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub source: AttendanceSource,
    pub notes: Option<String>,
}

/// Upsert payload keyed by (user_id, date).
#[derive(Debug, Clone)]
pub struct AttendanceUpsert {
    pub user_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub source: AttendanceSource,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn source_uses_self_on_the_wire() {
        assert_eq!(AttendanceSource::SelfCheckIn.as_str(), "self");
        assert_eq!(
            AttendanceSource::from_str("permission").ok(),
            Some(AttendanceSource::Permission)
        );
        assert_eq!(
            serde_json::to_string(&AttendanceSource::SelfCheckIn).ok().as_deref(),
            Some("\"self\"")
        );
    }

    #[test]
    fn leave_type_maps_to_status() {
        assert_eq!(AttendanceStatus::from(LeaveType::Izin), AttendanceStatus::Izin);
        assert_eq!(AttendanceStatus::from(LeaveType::Sakit), AttendanceStatus::Sakit);
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
    }
}
