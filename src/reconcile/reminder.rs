//! Push reminders for teachers and staff who have not checked in yet.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{JobOutcome, ReconcileError, SkipReason};
use crate::{
    calendar::WorkdayCalendar,
    model::settings::SchoolSettings,
    notify::{Notifier, NotifyError, PushMessage},
    store::SchoolStore,
    wib,
};

/// Reminders go out only while the late cutoff is this many minutes away.
pub const WINDOW_START_MINUTES: i64 = 5;
pub const WINDOW_END_MINUTES: i64 = 15;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReminderReport {
    pub date: NaiveDate,
    pub minutes_until_late: i64,
    pub pending_users: usize,
    pub subscriptions: usize,
    pub sent: usize,
    pub failed: usize,
    pub pruned: usize,
}

pub type ReminderOutcome = JobOutcome<ReminderReport>;

pub fn in_window(minutes_until_late: i64) -> bool {
    (WINDOW_START_MINUTES..=WINDOW_END_MINUTES).contains(&minutes_until_late)
}

pub fn reminder_message(settings: &SchoolSettings, minutes_until_late: i64) -> PushMessage {
    PushMessage {
        title: "Pengingat Absensi".to_string(),
        body: format!(
            "Anda belum melakukan absensi hari ini. Batas terlambat pukul {} ({} menit lagi).",
            wib::format_hhmm(settings.late_time),
            minutes_until_late
        ),
        url: Some("/attendance".to_string()),
        tag: Some("attendance-reminder".to_string()),
    }
}

/// Sends one push per subscription of every active teacher or staff member
/// without an attendance row today. Each send is independent: failures are
/// counted and the loop carries on.
#[instrument(skip_all, fields(now = %now))]
pub async fn dispatch_attendance_reminders(
    store: &dyn SchoolStore,
    notifier: Option<&dyn Notifier>,
    settings: &SchoolSettings,
    now: DateTime<Utc>,
) -> Result<ReminderOutcome, ReconcileError> {
    let today = wib::today(now);
    let minutes_until_late = wib::minutes_until(wib::current_time(now), settings.late_time);

    if !in_window(minutes_until_late) {
        debug!(minutes_until_late, "Outside reminder window");
        return Ok(JobOutcome::skipped(SkipReason::OutsideReminderWindow));
    }

    let holidays = store.holidays_between(today, today).await?;
    if let Some(day) = WorkdayCalendar::new(holidays).non_workday(today) {
        return Ok(JobOutcome::skipped_for(&day));
    }

    let checked_in: HashSet<u64> = store
        .attendance_on(today)
        .await?
        .into_iter()
        .map(|a| a.user_id)
        .collect();

    let pending: Vec<u64> = store
        .attendance_profiles()
        .await?
        .into_iter()
        .map(|p| p.id)
        .filter(|id| !checked_in.contains(id))
        .collect();

    if pending.is_empty() {
        return Ok(JobOutcome::skipped(SkipReason::EveryoneCheckedIn));
    }

    let notifier = notifier.ok_or(ReconcileError::MissingPushCredentials)?;

    let subscriptions = store.push_subscriptions_for(&pending).await?;
    let message = reminder_message(settings, minutes_until_late);

    let mut report = ReminderReport {
        date: today,
        minutes_until_late,
        pending_users: pending.len(),
        subscriptions: subscriptions.len(),
        ..Default::default()
    };

    for subscription in &subscriptions {
        match notifier.send(subscription, &message).await {
            Ok(()) => report.sent += 1,
            Err(NotifyError::Gone(code)) => {
                report.failed += 1;
                debug!(subscription_id = subscription.id, code, "Pruning stale subscription");
                match store.delete_push_subscription(subscription.id).await {
                    Ok(()) => report.pruned += 1,
                    Err(e) => warn!(error = %e, subscription_id = subscription.id, "Failed to prune subscription"),
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, user_id = subscription.user_id, "Reminder push failed");
            }
        }
    }

    info!(
        pending = report.pending_users,
        sent = report.sent,
        failed = report.failed,
        "Attendance reminders dispatched"
    );
    Ok(JobOutcome::Completed(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_inclusive_on_both_ends() {
        assert!(!in_window(4));
        assert!(in_window(5));
        assert!(in_window(10));
        assert!(in_window(15));
        assert!(!in_window(16));
        assert!(!in_window(20));
        assert!(!in_window(-3));
    }

    #[test]
    fn message_names_the_cutoff() {
        let msg = reminder_message(&SchoolSettings::default(), 10);
        assert!(msg.body.contains("07:30"));
        assert!(msg.body.contains("10 menit"));
    }
}
