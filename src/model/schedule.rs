use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Weekly lesson template. `day_of_week` holds the Indonesian day name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Schedule {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 7)]
    pub teacher_id: u64,
    #[schema(example = "X-IPA-1")]
    pub class_name: String,
    #[schema(example = "Matematika")]
    pub subject: String,
    #[schema(example = "Senin")]
    pub day_of_week: String,
    #[schema(example = "08:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "09:30:00", value_type = String)]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub teacher_id: u64,
    pub class_name: String,
    pub subject: String,
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Presence of a session for (schedule, date) means the lesson was taught.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeachingSession {
    pub id: u64,
    pub schedule_id: u64,
    pub teacher_id: u64,
    #[schema(example = "2025-01-06", format = "date", value_type = String)]
    pub session_date: NaiveDate,
    #[schema(format = "date-time", value_type = String)]
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoTeachRecord {
    pub id: u64,
    pub schedule_id: u64,
    pub teacher_id: u64,
    #[schema(example = "2025-01-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Tidak memulai sesi mengajar")]
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct NewNoTeachRecord {
    pub schedule_id: u64,
    pub teacher_id: u64,
    pub date: NaiveDate,
    pub reason: String,
}
