//! Backing store for every row the service reads or writes.
//!
//! Handlers and reconciliation routines only see [`SchoolStore`]; the MySQL
//! implementation is used in production and [`MemoryStore`] in tests.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, AttendanceUpsert},
    holiday::Holiday,
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    push_subscription::{NewPushSubscription, PushSubscription},
    schedule::{NewNoTeachRecord, NewSchedule, NoTeachRecord, Schedule, TeachingSession},
    settings::SchoolSettings,
    user::Profile,
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt row in {table}: {detail}")]
    CorruptRow { table: &'static str, detail: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait SchoolStore: Send + Sync {
    // settings
    async fn load_settings(&self) -> StoreResult<Option<SchoolSettings>>;
    async fn save_settings(&self, settings: &SchoolSettings) -> StoreResult<()>;

    // holidays
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>>;
    /// `None` when a holiday already exists on that date.
    async fn insert_holiday(&self, date: NaiveDate, name: &str) -> StoreResult<Option<Holiday>>;
    async fn delete_holiday(&self, id: u64) -> StoreResult<bool>;

    // profiles
    async fn get_profile(&self, user_id: u64) -> StoreResult<Option<Profile>>;
    /// Active users whose role takes attendance (teachers and staff).
    async fn attendance_profiles(&self) -> StoreResult<Vec<Profile>>;

    // leave
    async fn insert_leave(&self, leave: &NewLeaveRequest) -> StoreResult<LeaveRequest>;
    async fn get_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;
    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)>;
    /// Moves a pending request to `status`. `None` if missing or no longer pending.
    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        reviewer: u64,
    ) -> StoreResult<Option<LeaveRequest>>;
    async fn approved_leaves_on(&self, date: NaiveDate) -> StoreResult<Vec<LeaveRequest>>;

    // attendance
    /// Insert or overwrite the row for (user_id, date).
    async fn upsert_attendance(&self, entry: &AttendanceUpsert) -> StoreResult<()>;
    /// `false` when the user already has a row for the date.
    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        time: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool>;
    /// `false` when there is no open check-in for the date.
    async fn record_check_out(&self, user_id: u64, date: NaiveDate, time: NaiveTime)
    -> StoreResult<bool>;
    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>>;

    // schedules and sessions
    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule>;
    async fn get_schedule(&self, id: u64) -> StoreResult<Option<Schedule>>;
    async fn list_schedules(
        &self,
        day: Option<&str>,
        teacher_id: Option<u64>,
    ) -> StoreResult<Vec<Schedule>>;
    /// `None` when a session already exists for (schedule, date).
    async fn start_session(
        &self,
        schedule: &Schedule,
        date: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<TeachingSession>>;
    async fn session_exists(&self, schedule_id: u64, date: NaiveDate) -> StoreResult<bool>;

    // no-teach records
    /// Single conditional insert on (schedule_id, date); `true` if a row was created.
    async fn insert_no_teach(&self, record: &NewNoTeachRecord) -> StoreResult<bool>;
    async fn no_teach_on(&self, date: NaiveDate) -> StoreResult<Vec<NoTeachRecord>>;

    // push subscriptions
    async fn save_push_subscription(
        &self,
        user_id: u64,
        subscription: &NewPushSubscription,
    ) -> StoreResult<PushSubscription>;
    async fn push_subscriptions_for(&self, user_ids: &[u64]) -> StoreResult<Vec<PushSubscription>>;
    async fn delete_push_subscription(&self, id: u64) -> StoreResult<()>;
}
