use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// School-wide attendance cutoffs, all in WIB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SchoolSettings {
    #[schema(example = "SMA Negeri 1")]
    pub school_name: String,
    #[schema(example = "06:30:00", value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(example = "07:30:00", value_type = String)]
    pub late_time: NaiveTime,
    #[schema(example = "14:00:00", value_type = String)]
    pub check_out_time: NaiveTime,
}

impl Default for SchoolSettings {
    fn default() -> Self {
        Self {
            school_name: "Sekolah".to_string(),
            check_in_time: NaiveTime::from_hms_opt(6, 30, 0).unwrap_or(NaiveTime::MIN),
            late_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap_or(NaiveTime::MIN),
            check_out_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}
