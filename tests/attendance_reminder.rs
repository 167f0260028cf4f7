mod common;

use std::collections::HashSet;

use common::{RecordingNotifier, date, hm, profile, subscribe, wib_at};
use sekolah::{
    model::{attendance::AttendanceStatus, role::Role, settings::SchoolSettings},
    reconcile::{JobOutcome, ReconcileError, SkipReason, reminder::dispatch_attendance_reminders},
    store::{MemoryStore, SchoolStore},
};

fn monday() -> chrono::NaiveDate {
    date(2025, 1, 6)
}

async fn staffed_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_profile(profile(1, Role::Admin)).await;
    store.add_profile(profile(7, Role::Teacher)).await;
    store.add_profile(profile(8, Role::Staff)).await;
    subscribe(&store, 1, "https://push.test/admin").await;
    subscribe(&store, 7, "https://push.test/teacher").await;
    subscribe(&store, 8, "https://push.test/staff").await;
    store
}

#[tokio::test]
async fn reminds_only_those_without_attendance() {
    let store = staffed_store().await;
    store
        .insert_check_in(7, monday(), hm(7, 5), AttendanceStatus::Hadir)
        .await
        .unwrap();
    let notifier = RecordingNotifier::default();

    let outcome = dispatch_attendance_reminders(
        &store,
        Some(&notifier),
        &SchoolSettings::default(),
        wib_at(monday(), 7, 20),
    )
    .await
    .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.minutes_until_late, 10);
    assert_eq!(report.pending_users, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(notifier.delivered_to(), vec!["https://push.test/staff".to_string()]);
}

#[tokio::test]
async fn too_early_is_outside_the_window() {
    let store = staffed_store().await;
    let notifier = RecordingNotifier::default();

    let outcome = dispatch_attendance_reminders(
        &store,
        Some(&notifier),
        &SchoolSettings::default(),
        wib_at(monday(), 7, 10),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped { reason: SkipReason::OutsideReminderWindow, .. }
    ));
    assert!(notifier.delivered_to().is_empty());
}

#[tokio::test]
async fn nothing_to_send_when_everyone_checked_in() {
    let store = staffed_store().await;
    for user in [7, 8] {
        store
            .insert_check_in(user, monday(), hm(7, 0), AttendanceStatus::Hadir)
            .await
            .unwrap();
    }

    let outcome = dispatch_attendance_reminders(
        &store,
        None,
        &SchoolSettings::default(),
        wib_at(monday(), 7, 20),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped { reason: SkipReason::EveryoneCheckedIn, .. }
    ));
}

#[tokio::test]
async fn missing_credentials_fail_the_run() {
    let store = staffed_store().await;

    let err = dispatch_attendance_reminders(
        &store,
        None,
        &SchoolSettings::default(),
        wib_at(monday(), 7, 20),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReconcileError::MissingPushCredentials));
}

#[tokio::test]
async fn failures_are_tallied_and_gone_subscriptions_pruned() {
    let store = staffed_store().await;
    subscribe(&store, 7, "https://push.test/teacher-tablet").await;
    let notifier = RecordingNotifier {
        rejecting: HashSet::from(["https://push.test/teacher".to_string()]),
        gone: HashSet::from(["https://push.test/teacher-tablet".to_string()]),
        ..Default::default()
    };

    let outcome = dispatch_attendance_reminders(
        &store,
        Some(&notifier),
        &SchoolSettings::default(),
        wib_at(monday(), 7, 25),
    )
    .await
    .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.subscriptions, 3);
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.pruned, 1);
    assert_eq!(store.push_subscription_count().await, 3);
}

#[tokio::test]
async fn fridays_are_skipped_inside_the_window() {
    let store = staffed_store().await;

    let outcome = dispatch_attendance_reminders(
        &store,
        None,
        &SchoolSettings::default(),
        wib_at(date(2025, 1, 10), 7, 20),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped { reason: SkipReason::Friday, .. }
    ));
}
