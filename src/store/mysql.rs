use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{SchoolStore, StoreError, StoreResult};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceSource, AttendanceStatus, AttendanceUpsert},
    holiday::Holiday,
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    push_subscription::{NewPushSubscription, PushSubscription},
    role::Role,
    schedule::{NewNoTeachRecord, NewSchedule, NoTeachRecord, Schedule, TeachingSession},
    settings::SchoolSettings,
    user::Profile,
};

const SETTINGS_ROW_ID: u8 = 1;

/// `SchoolStore` over a MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Unique-key violations only. SQLSTATE 23000 also covers foreign-key and
/// not-null failures, which must surface as errors.
fn is_duplicate(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn parse_column<T: FromStr>(table: &'static str, value: &str) -> StoreResult<T> {
    value.parse().map_err(|_| StoreError::CorruptRow {
        table,
        detail: format!("unexpected value {value:?}"),
    })
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
}

#[derive(FromRow)]
struct SettingsRow {
    school_name: String,
    check_in_time: NaiveTime,
    late_time: NaiveTime,
    check_out_time: NaiveTime,
}

#[derive(FromRow)]
struct ProfileRow {
    id: u64,
    username: String,
    full_name: String,
    role_id: u8,
    is_active: bool,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> StoreResult<Self> {
        let role = Role::from_id(row.role_id).ok_or_else(|| StoreError::CorruptRow {
            table: "users",
            detail: format!("unknown role id {}", row.role_id),
        })?;
        Ok(Profile {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role,
            is_active: row.is_active,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    user_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    status: String,
    reviewed_by: Option<u64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            leave_type: parse_column("leave_requests", &row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_column("leave_requests", &row.status)?,
            reviewed_by: row.reviewed_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    source: String,
    notes: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            status: parse_column::<AttendanceStatus>("attendance", &row.status)?,
            check_in: row.check_in,
            check_out: row.check_out,
            source: parse_column::<AttendanceSource>("attendance", &row.source)?,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct ScheduleRow {
    id: u64,
    teacher_id: u64,
    class_name: String,
    subject: String,
    day_of_week: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Schedule {
            id: row.id,
            teacher_id: row.teacher_id,
            class_name: row.class_name,
            subject: row.subject,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(FromRow)]
struct HolidayRow {
    id: u64,
    date: NaiveDate,
    name: String,
}

#[derive(FromRow)]
struct NoTeachRow {
    id: u64,
    schedule_id: u64,
    teacher_id: u64,
    date: NaiveDate,
    reason: String,
}

#[derive(FromRow)]
struct PushRow {
    id: u64,
    user_id: u64,
    endpoint: String,
    p256dh: String,
    auth: String,
}

impl From<PushRow> for PushSubscription {
    fn from(row: PushRow) -> Self {
        PushSubscription {
            id: row.id,
            user_id: row.user_id,
            endpoint: row.endpoint,
            p256dh: row.p256dh,
            auth: row.auth,
        }
    }
}

const LEAVE_COLUMNS: &str =
    "id, user_id, leave_type, start_date, end_date, reason, status, reviewed_by, created_at";
const SCHEDULE_COLUMNS: &str =
    "id, teacher_id, class_name, subject, day_of_week, start_time, end_time";

#[async_trait::async_trait]
impl SchoolStore for MySqlStore {
    async fn load_settings(&self) -> StoreResult<Option<SchoolSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT school_name, check_in_time, late_time, check_out_time
            FROM school_settings
            WHERE id = ?
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SchoolSettings {
            school_name: r.school_name,
            check_in_time: r.check_in_time,
            late_time: r.late_time,
            check_out_time: r.check_out_time,
        }))
    }

    async fn save_settings(&self, settings: &SchoolSettings) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO school_settings (id, school_name, check_in_time, late_time, check_out_time)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                school_name = VALUES(school_name),
                check_in_time = VALUES(check_in_time),
                late_time = VALUES(late_time),
                check_out_time = VALUES(check_out_time)
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(&settings.school_name)
        .bind(settings.check_in_time)
        .bind(settings.late_time)
        .bind(settings.check_out_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            "SELECT id, date, name FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Holiday {
                id: r.id,
                date: r.date,
                name: r.name,
            })
            .collect())
    }

    async fn insert_holiday(&self, date: NaiveDate, name: &str) -> StoreResult<Option<Holiday>> {
        let result = sqlx::query("INSERT INTO holidays (date, name) VALUES (?, ?)")
            .bind(date)
            .bind(name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Some(Holiday {
                id: done.last_insert_id(),
                date,
                name: name.to_string(),
            })),
            Err(e) if is_duplicate(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_profile(&self, user_id: u64) -> StoreResult<Option<Profile>> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, full_name, role_id, is_active FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn attendance_profiles(&self) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, full_name, role_id, is_active
            FROM users
            WHERE is_active = TRUE
            AND role_id IN (?, ?)
            ORDER BY id
            "#,
        )
        .bind(Role::Teacher.id())
        .bind(Role::Staff.id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn insert_leave(&self, leave: &NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, leave_type, start_date, end_date, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.user_id)
        .bind(leave.leave_type.as_str())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.reason.as_deref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.get_leave(id).await?.ok_or_else(|| StoreError::CorruptRow {
            table: "leave_requests",
            detail: format!("inserted row {id} not readable"),
        })
    }

    async fn get_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = query.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_str()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, "Fetching leave requests");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let rows = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let leaves = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((leaves, total))
    }

    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        reviewer: u64,
    ) -> StoreResult<Option<LeaveRequest>> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, reviewed_by = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.as_str())
        .bind(reviewer)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_leave(id).await
    }

    async fn approved_leaves_on(&self, date: NaiveDate) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE status = 'approved' AND start_date <= ? AND end_date >= ?"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(date)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn upsert_attendance(&self, entry: &AttendanceUpsert) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, status, source, notes)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                source = VALUES(source),
                notes = VALUES(notes)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.date)
        .bind(entry.status.as_str())
        .bind(entry.source.as_str())
        .bind(entry.notes.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        time: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, status, check_in, source)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(status.as_str())
        .bind(time)
        .bind(AttendanceSource::SelfCheckIn.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_check_out(
        &self,
        user_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?
            WHERE user_id = ?
            AND date = ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(time)
        .bind(user_id)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, user_id, date, status, check_in, check_out, source, notes
            FROM attendance
            WHERE date = ?
            ORDER BY user_id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule> {
        let result = sqlx::query(
            r#"
            INSERT INTO schedules
                (teacher_id, class_name, subject, day_of_week, start_time, end_time)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(schedule.teacher_id)
        .bind(&schedule.class_name)
        .bind(&schedule.subject)
        .bind(&schedule.day_of_week)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .execute(&self.pool)
        .await?;

        Ok(Schedule {
            id: result.last_insert_id(),
            teacher_id: schedule.teacher_id,
            class_name: schedule.class_name.clone(),
            subject: schedule.subject.clone(),
            day_of_week: schedule.day_of_week.clone(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        })
    }

    async fn get_schedule(&self, id: u64) -> StoreResult<Option<Schedule>> {
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?");
        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Schedule::from))
    }

    async fn list_schedules(
        &self,
        day: Option<&str>,
        teacher_id: Option<u64>,
    ) -> StoreResult<Vec<Schedule>> {
        let mut sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE 1=1");
        if day.is_some() {
            sql.push_str(" AND day_of_week = ?");
        }
        if teacher_id.is_some() {
            sql.push_str(" AND teacher_id = ?");
        }
        sql.push_str(" ORDER BY start_time, id");

        let mut q = sqlx::query_as::<_, ScheduleRow>(&sql);
        if let Some(day) = day {
            q = q.bind(day);
        }
        if let Some(teacher_id) = teacher_id {
            q = q.bind(teacher_id);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    async fn start_session(
        &self,
        schedule: &Schedule,
        date: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<TeachingSession>> {
        let result = sqlx::query(
            r#"
            INSERT INTO teaching_sessions (schedule_id, teacher_id, session_date, started_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.teacher_id)
        .bind(date)
        .bind(started_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Some(TeachingSession {
                id: done.last_insert_id(),
                schedule_id: schedule.id,
                teacher_id: schedule.teacher_id,
                session_date: date,
                started_at,
            })),
            Err(e) if is_duplicate(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn session_exists(&self, schedule_id: u64, date: NaiveDate) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM teaching_sessions WHERE schedule_id = ? AND session_date = ?",
        )
        .bind(schedule_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert_no_teach(&self, record: &NewNoTeachRecord) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO no_teach_records (schedule_id, teacher_id, date, reason)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.schedule_id)
        .bind(record.teacher_id)
        .bind(record.date)
        .bind(&record.reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn no_teach_on(&self, date: NaiveDate) -> StoreResult<Vec<NoTeachRecord>> {
        let rows = sqlx::query_as::<_, NoTeachRow>(
            "SELECT id, schedule_id, teacher_id, date, reason FROM no_teach_records WHERE date = ? ORDER BY id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| NoTeachRecord {
                id: r.id,
                schedule_id: r.schedule_id,
                teacher_id: r.teacher_id,
                date: r.date,
                reason: r.reason,
            })
            .collect())
    }

    async fn save_push_subscription(
        &self,
        user_id: u64,
        subscription: &NewPushSubscription,
    ) -> StoreResult<PushSubscription> {
        sqlx::query(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                user_id = VALUES(user_id),
                p256dh = VALUES(p256dh),
                auth = VALUES(auth)
            "#,
        )
        .bind(user_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, PushRow>(
            "SELECT id, user_id, endpoint, p256dh, auth FROM push_subscriptions WHERE endpoint = ?",
        )
        .bind(&subscription.endpoint)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn push_subscriptions_for(&self, user_ids: &[u64]) -> StoreResult<Vec<PushSubscription>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, user_id, endpoint, p256dh, auth FROM push_subscriptions WHERE user_id IN ({placeholders}) ORDER BY user_id, id"
        );

        let mut q = sqlx::query_as::<_, PushRow>(&sql);
        for id in user_ids {
            q = q.bind(*id);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PushSubscription::from).collect())
    }

    async fn delete_push_subscription(&self, id: u64) -> StoreResult<()> {
        sqlx::query("DELETE FROM push_subscriptions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    /// Integrity violation as MySQL reports it: SQLSTATE 23000 for every kind.
    #[derive(Debug)]
    struct Violation(ErrorKind);

    impl fmt::Display for Violation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "integrity constraint violation")
        }
    }

    impl StdError for Violation {}

    impl DatabaseError for Violation {
        fn message(&self) -> &str {
            "integrity constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23000"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn violation(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(Violation(kind)))
    }

    #[test]
    fn only_unique_violations_count_as_duplicates() {
        assert!(is_duplicate(&violation(ErrorKind::UniqueViolation)));
        assert!(!is_duplicate(&violation(ErrorKind::ForeignKeyViolation)));
        assert!(!is_duplicate(&violation(ErrorKind::NotNullViolation)));
        assert!(!is_duplicate(&sqlx::Error::RowNotFound));
    }
}
