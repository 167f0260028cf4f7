//! Flags scheduled lessons that were never started once the school day is over.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{JobOutcome, ReconcileError, SkipReason};
use crate::{
    calendar::WorkdayCalendar,
    model::{schedule::NewNoTeachRecord, settings::SchoolSettings},
    store::SchoolStore,
    wib,
};

pub const NO_TEACH_REASON: &str = "Tidak memulai sesi mengajar";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NoShowReport {
    pub date: NaiveDate,
    pub checked: usize,
    pub not_due: usize,
    pub taught: usize,
    pub excused: usize,
    pub recorded: usize,
    pub already_recorded: usize,
}

pub type NoShowOutcome = JobOutcome<NoShowReport>;

/// Records a no-teach entry for every lesson today that ended without a
/// teaching session, unless the teacher is on approved leave.
///
/// Does nothing on Fridays, holidays, or before the configured check-out
/// time. Records are written with a conditional insert on
/// (schedule, date), so overlapping runs cannot double-record.
#[instrument(skip_all, fields(now = %now))]
pub async fn detect_no_shows(
    store: &dyn SchoolStore,
    settings: &SchoolSettings,
    now: DateTime<Utc>,
) -> Result<NoShowOutcome, ReconcileError> {
    let today = wib::today(now);
    let current = wib::current_time(now);

    let holidays = store.holidays_between(today, today).await?;
    if let Some(day) = WorkdayCalendar::new(holidays).non_workday(today) {
        debug!(%today, "Not a workday, skipping no-show detection");
        return Ok(JobOutcome::skipped_for(&day));
    }

    if current < settings.check_out_time {
        debug!(
            current = %wib::format_hhmm(current),
            check_out = %wib::format_hhmm(settings.check_out_time),
            "Before check-out, skipping no-show detection"
        );
        return Ok(JobOutcome::skipped(SkipReason::BeforeCheckOut));
    }

    let on_leave: HashSet<u64> = store
        .approved_leaves_on(today)
        .await?
        .into_iter()
        .map(|l| l.user_id)
        .collect();

    let schedules = store
        .list_schedules(Some(wib::day_name_of(today)), None)
        .await?;

    let mut report = NoShowReport {
        date: today,
        ..Default::default()
    };

    for schedule in schedules {
        report.checked += 1;

        if !is_due(schedule.end_time, current) {
            report.not_due += 1;
            continue;
        }
        if on_leave.contains(&schedule.teacher_id) {
            report.excused += 1;
            continue;
        }
        if store.session_exists(schedule.id, today).await? {
            report.taught += 1;
            continue;
        }

        let created = store
            .insert_no_teach(&NewNoTeachRecord {
                schedule_id: schedule.id,
                teacher_id: schedule.teacher_id,
                date: today,
                reason: NO_TEACH_REASON.to_string(),
            })
            .await?;

        if created {
            info!(schedule_id = schedule.id, teacher_id = schedule.teacher_id, "Recorded no-teach");
            report.recorded += 1;
        } else {
            report.already_recorded += 1;
        }
    }

    info!(
        checked = report.checked,
        recorded = report.recorded,
        excused = report.excused,
        "No-show detection finished"
    );
    Ok(JobOutcome::Completed(report))
}

fn is_due(end_time: NaiveTime, now: NaiveTime) -> bool {
    end_time <= now
}
