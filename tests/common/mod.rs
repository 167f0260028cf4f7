#![allow(dead_code)]

use std::{collections::HashSet, sync::Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sekolah::{
    model::{
        leave_request::{LeaveRequest, LeaveStatus, LeaveType},
        push_subscription::{NewPushSubscription, PushSubscription},
        role::Role,
        schedule::{NewSchedule, Schedule},
        user::Profile,
    },
    notify::{Notifier, NotifyError, PushMessage},
    store::{MemoryStore, SchoolStore},
    wib::FixedClock,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// The UTC instant at which the WIB wall clock reads `h:m` on `day`.
pub fn wib_at(day: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    FixedClock::at_wib(day, hm(h, m)).0
}

pub fn profile(id: u64, role: Role) -> Profile {
    Profile {
        id,
        username: format!("user{id}"),
        full_name: format!("User {id}"),
        role,
        is_active: true,
    }
}

pub fn leave(
    id: u64,
    user_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    status: LeaveStatus,
) -> LeaveRequest {
    LeaveRequest {
        id,
        user_id,
        leave_type: LeaveType::Sakit,
        start_date: start,
        end_date: end,
        reason: Some("Demam".to_string()),
        status,
        reviewed_by: None,
        created_at: Utc::now(),
    }
}

pub async fn schedule(
    store: &MemoryStore,
    teacher_id: u64,
    day: &str,
    start: NaiveTime,
    end: NaiveTime,
) -> Schedule {
    store
        .insert_schedule(&NewSchedule {
            teacher_id,
            class_name: "X-IPA-1".to_string(),
            subject: "Matematika".to_string(),
            day_of_week: day.to_string(),
            start_time: start,
            end_time: end,
        })
        .await
        .unwrap()
}

pub async fn subscribe(store: &MemoryStore, user_id: u64, endpoint: &str) -> PushSubscription {
    store
        .save_push_subscription(
            user_id,
            &NewPushSubscription {
                endpoint: endpoint.to_string(),
                p256dh: "key".to_string(),
                auth: "secret".to_string(),
            },
        )
        .await
        .unwrap()
}

/// Records every send. Endpoints listed in `rejecting` fail with 500 and
/// those in `gone` with 410.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, PushMessage)>>,
    pub rejecting: HashSet<String>,
    pub gone: HashSet<String>,
}

impl RecordingNotifier {
    pub fn delivered_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), NotifyError> {
        if self.gone.contains(&subscription.endpoint) {
            return Err(NotifyError::Gone(410));
        }
        if self.rejecting.contains(&subscription.endpoint) {
            return Err(NotifyError::Rejected(500));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), message.clone()));
        Ok(())
    }
}
