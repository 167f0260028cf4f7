mod common;

use common::{date, hm, leave, schedule, wib_at};
use sekolah::{
    model::{leave_request::LeaveStatus, settings::SchoolSettings},
    reconcile::{
        JobOutcome, SkipReason,
        no_show::{NO_TEACH_REASON, detect_no_shows},
    },
    store::{MemoryStore, SchoolStore},
};

// Monday
fn monday() -> chrono::NaiveDate {
    date(2025, 1, 6)
}

#[tokio::test]
async fn does_nothing_before_check_out() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 13, 59))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        JobOutcome::Skipped { reason: SkipReason::BeforeCheckOut, .. }
    ));
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn records_a_missed_lesson_once() {
    let store = MemoryStore::new();
    let slot = schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    let settings = SchoolSettings::default();

    let first = detect_no_shows(&store, &settings, wib_at(monday(), 14, 5))
        .await
        .unwrap();
    let report = first.report().unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.recorded, 1);

    let records = store.no_teach_on(monday()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].schedule_id, slot.id);
    assert_eq!(records[0].teacher_id, 7);
    assert_eq!(records[0].reason, NO_TEACH_REASON);

    let second = detect_no_shows(&store, &settings, wib_at(monday(), 14, 30))
        .await
        .unwrap();
    let report = second.report().unwrap();
    assert_eq!(report.recorded, 0);
    assert_eq!(report.already_recorded, 1);
    assert_eq!(store.no_teach_count().await, 1);
}

#[tokio::test]
async fn approved_leave_excuses_the_teacher() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    store
        .add_leave(leave(1, 7, monday(), monday(), LeaveStatus::Approved))
        .await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().excused, 1);
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn pending_leave_does_not_excuse() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    store
        .add_leave(leave(1, 7, monday(), monday(), LeaveStatus::Pending))
        .await;

    detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    assert_eq!(store.no_teach_count().await, 1);
}

#[tokio::test]
async fn a_started_session_counts_as_taught() {
    let store = MemoryStore::new();
    let slot = schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    store.add_session(slot.id, 7, monday()).await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().taught, 1);
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn lessons_on_other_days_are_ignored() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Selasa", hm(8, 0), hm(10, 0)).await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().checked, 0);
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn fridays_and_holidays_are_skipped() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Jumat", hm(8, 0), hm(10, 0)).await;
    schedule(&store, 7, "Selasa", hm(8, 0), hm(10, 0)).await;
    store
        .insert_holiday(date(2025, 1, 7), "Libur")
        .await
        .unwrap();
    let settings = SchoolSettings::default();

    let friday = detect_no_shows(&store, &settings, wib_at(date(2025, 1, 10), 15, 0))
        .await
        .unwrap();
    assert!(matches!(
        friday,
        JobOutcome::Skipped { reason: SkipReason::Friday, .. }
    ));

    let holiday = detect_no_shows(&store, &settings, wib_at(date(2025, 1, 7), 15, 0))
        .await
        .unwrap();
    assert!(matches!(
        holiday,
        JobOutcome::Skipped { reason: SkipReason::Holiday, .. }
    ));
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn a_lesson_still_running_is_not_due() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Senin", hm(13, 0), hm(15, 0)).await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.not_due, 1);
    assert_eq!(report.recorded, 0);
    assert_eq!(store.no_teach_count().await, 0);
}

#[tokio::test]
async fn a_lesson_ending_this_minute_is_recorded() {
    let store = MemoryStore::new();
    schedule(&store, 7, "Senin", hm(13, 0), hm(14, 5)).await;
    schedule(&store, 8, "Senin", hm(13, 0), hm(14, 6)).await;

    let outcome = detect_no_shows(&store, &SchoolSettings::default(), wib_at(monday(), 14, 5))
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.recorded, 1);
    assert_eq!(report.not_due, 1);
    let records = store.no_teach_on(monday()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].teacher_id, 7);
}
