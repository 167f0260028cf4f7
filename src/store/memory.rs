use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;

use super::{SchoolStore, StoreError, StoreResult};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceSource, AttendanceStatus, AttendanceUpsert},
    holiday::Holiday,
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    push_subscription::{NewPushSubscription, PushSubscription},
    schedule::{NewNoTeachRecord, NewSchedule, NoTeachRecord, Schedule, TeachingSession},
    settings::SchoolSettings,
    user::Profile,
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    settings: Option<SchoolSettings>,
    settings_unavailable: bool,
    profiles: BTreeMap<u64, Profile>,
    holidays: BTreeMap<u64, Holiday>,
    leaves: BTreeMap<u64, LeaveRequest>,
    attendance: BTreeMap<(u64, NaiveDate), AttendanceRecord>,
    failing_attendance_dates: HashSet<NaiveDate>,
    schedules: BTreeMap<u64, Schedule>,
    sessions: BTreeMap<(u64, NaiveDate), TeachingSession>,
    no_teach: BTreeMap<(u64, NaiveDate), NoTeachRecord>,
    push: BTreeMap<u64, PushSubscription>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process `SchoolStore` with the same uniqueness rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    /// Inserts a leave request in any state, bypassing the pending → decided flow.
    pub async fn add_leave(&self, leave: LeaveRequest) {
        let mut t = self.tables.write().await;
        t.next_id = t.next_id.max(leave.id);
        t.leaves.insert(leave.id, leave);
    }

    pub async fn add_session(&self, schedule_id: u64, teacher_id: u64, date: NaiveDate) {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        t.sessions.insert(
            (schedule_id, date),
            TeachingSession {
                id,
                schedule_id,
                teacher_id,
                session_date: date,
                started_at: Utc::now(),
            },
        );
    }

    /// Makes every attendance upsert for `date` fail.
    pub async fn fail_attendance_on(&self, date: NaiveDate) {
        self.tables.write().await.failing_attendance_dates.insert(date);
    }

    pub async fn clear_attendance_failures(&self) {
        self.tables.write().await.failing_attendance_dates.clear();
    }

    /// Makes `load_settings` fail, as an unreachable database would.
    pub async fn set_settings_unavailable(&self, unavailable: bool) {
        self.tables.write().await.settings_unavailable = unavailable;
    }

    pub async fn attendance_for(&self, user_id: u64, date: NaiveDate) -> Option<AttendanceRecord> {
        self.tables.read().await.attendance.get(&(user_id, date)).cloned()
    }

    pub async fn attendance_count(&self) -> usize {
        self.tables.read().await.attendance.len()
    }

    pub async fn no_teach_count(&self) -> usize {
        self.tables.read().await.no_teach.len()
    }

    pub async fn push_subscription_count(&self) -> usize {
        self.tables.read().await.push.len()
    }
}

#[async_trait::async_trait]
impl SchoolStore for MemoryStore {
    async fn load_settings(&self) -> StoreResult<Option<SchoolSettings>> {
        let t = self.tables.read().await;
        if t.settings_unavailable {
            return Err(StoreError::Unavailable("settings table unreachable".into()));
        }
        Ok(t.settings.clone())
    }

    async fn save_settings(&self, settings: &SchoolSettings) -> StoreResult<()> {
        self.tables.write().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        let t = self.tables.read().await;
        let mut out: Vec<Holiday> = t
            .holidays
            .values()
            .filter(|h| from <= h.date && h.date <= to)
            .cloned()
            .collect();
        out.sort_by_key(|h| h.date);
        Ok(out)
    }

    async fn insert_holiday(&self, date: NaiveDate, name: &str) -> StoreResult<Option<Holiday>> {
        let mut t = self.tables.write().await;
        if t.holidays.values().any(|h| h.date == date) {
            return Ok(None);
        }
        let id = t.next_id();
        let holiday = Holiday {
            id,
            date,
            name: name.to_string(),
        };
        t.holidays.insert(id, holiday.clone());
        Ok(Some(holiday))
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        Ok(self.tables.write().await.holidays.remove(&id).is_some())
    }

    async fn get_profile(&self, user_id: u64) -> StoreResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn attendance_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self
            .tables
            .read()
            .await
            .profiles
            .values()
            .filter(|p| p.is_active && p.role.takes_attendance())
            .cloned()
            .collect())
    }

    async fn insert_leave(&self, leave: &NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let row = LeaveRequest {
            id,
            user_id: leave.user_id,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason.clone(),
            status: LeaveStatus::Pending,
            reviewed_by: None,
            created_at: Utc::now(),
        };
        t.leaves.insert(id, row.clone());
        Ok(row)
    }

    async fn get_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.tables.read().await.leaves.get(&id).cloned())
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let t = self.tables.read().await;
        let mut matching: Vec<LeaveRequest> = t
            .leaves
            .values()
            .filter(|l| query.user_id.is_none_or(|u| l.user_id == u))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        reviewer: u64,
    ) -> StoreResult<Option<LeaveRequest>> {
        let mut t = self.tables.write().await;
        match t.leaves.get_mut(&id) {
            Some(leave) if leave.status == LeaveStatus::Pending => {
                leave.status = status;
                leave.reviewed_by = Some(reviewer);
                Ok(Some(leave.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn approved_leaves_on(&self, date: NaiveDate) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self
            .tables
            .read()
            .await
            .leaves
            .values()
            .filter(|l| l.status == LeaveStatus::Approved && l.covers(date))
            .cloned()
            .collect())
    }

    async fn upsert_attendance(&self, entry: &AttendanceUpsert) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.failing_attendance_dates.contains(&entry.date) {
            return Err(StoreError::Unavailable(format!(
                "attendance write rejected for {}",
                entry.date
            )));
        }
        let next = t.next_id();
        let row = t
            .attendance
            .entry((entry.user_id, entry.date))
            .or_insert_with(|| AttendanceRecord {
                id: next,
                user_id: entry.user_id,
                date: entry.date,
                status: entry.status,
                check_in: None,
                check_out: None,
                source: entry.source,
                notes: None,
            });
        row.status = entry.status;
        row.source = entry.source;
        row.notes = entry.notes.clone();
        Ok(())
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        time: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.attendance.contains_key(&(user_id, date)) {
            return Ok(false);
        }
        let id = t.next_id();
        t.attendance.insert(
            (user_id, date),
            AttendanceRecord {
                id,
                user_id,
                date,
                status,
                check_in: Some(time),
                check_out: None,
                source: AttendanceSource::SelfCheckIn,
                notes: None,
            },
        );
        Ok(true)
    }

    async fn record_check_out(
        &self,
        user_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.attendance.get_mut(&(user_id, date)) {
            Some(row) if row.check_in.is_some() && row.check_out.is_none() => {
                row.check_out = Some(time);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .attendance
            .values()
            .filter(|a| a.date == date)
            .cloned()
            .collect())
    }

    async fn insert_schedule(&self, schedule: &NewSchedule) -> StoreResult<Schedule> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let row = Schedule {
            id,
            teacher_id: schedule.teacher_id,
            class_name: schedule.class_name.clone(),
            subject: schedule.subject.clone(),
            day_of_week: schedule.day_of_week.clone(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        };
        t.schedules.insert(id, row.clone());
        Ok(row)
    }

    async fn get_schedule(&self, id: u64) -> StoreResult<Option<Schedule>> {
        Ok(self.tables.read().await.schedules.get(&id).cloned())
    }

    async fn list_schedules(
        &self,
        day: Option<&str>,
        teacher_id: Option<u64>,
    ) -> StoreResult<Vec<Schedule>> {
        let t = self.tables.read().await;
        let mut out: Vec<Schedule> = t
            .schedules
            .values()
            .filter(|s| day.is_none_or(|d| s.day_of_week == d))
            .filter(|s| teacher_id.is_none_or(|id| s.teacher_id == id))
            .cloned()
            .collect();
        out.sort_by_key(|s| (s.start_time, s.id));
        Ok(out)
    }

    async fn start_session(
        &self,
        schedule: &Schedule,
        date: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> StoreResult<Option<TeachingSession>> {
        let mut t = self.tables.write().await;
        if t.sessions.contains_key(&(schedule.id, date)) {
            return Ok(None);
        }
        let id = t.next_id();
        let session = TeachingSession {
            id,
            schedule_id: schedule.id,
            teacher_id: schedule.teacher_id,
            session_date: date,
            started_at,
        };
        t.sessions.insert((schedule.id, date), session.clone());
        Ok(Some(session))
    }

    async fn session_exists(&self, schedule_id: u64, date: NaiveDate) -> StoreResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .sessions
            .contains_key(&(schedule_id, date)))
    }

    async fn insert_no_teach(&self, record: &NewNoTeachRecord) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.no_teach.contains_key(&(record.schedule_id, record.date)) {
            return Ok(false);
        }
        let id = t.next_id();
        t.no_teach.insert(
            (record.schedule_id, record.date),
            NoTeachRecord {
                id,
                schedule_id: record.schedule_id,
                teacher_id: record.teacher_id,
                date: record.date,
                reason: record.reason.clone(),
            },
        );
        Ok(true)
    }

    async fn no_teach_on(&self, date: NaiveDate) -> StoreResult<Vec<NoTeachRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .no_teach
            .values()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn save_push_subscription(
        &self,
        user_id: u64,
        subscription: &NewPushSubscription,
    ) -> StoreResult<PushSubscription> {
        let mut t = self.tables.write().await;
        let existing = t
            .push
            .values()
            .find(|p| p.endpoint == subscription.endpoint)
            .map(|p| p.id);
        let id = match existing {
            Some(id) => id,
            None => t.next_id(),
        };
        let row = PushSubscription {
            id,
            user_id,
            endpoint: subscription.endpoint.clone(),
            p256dh: subscription.p256dh.clone(),
            auth: subscription.auth.clone(),
        };
        t.push.insert(id, row.clone());
        Ok(row)
    }

    async fn push_subscriptions_for(&self, user_ids: &[u64]) -> StoreResult<Vec<PushSubscription>> {
        Ok(self
            .tables
            .read()
            .await
            .push
            .values()
            .filter(|p| user_ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn delete_push_subscription(&self, id: u64) -> StoreResult<()> {
        self.tables.write().await.push.remove(&id);
        Ok(())
    }
}
