//! Turns an approved leave request into attendance rows.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ReconcileError;
use crate::{
    calendar::{NonWorkday, WorkdayCalendar, dates_between},
    model::{
        attendance::{AttendanceSource, AttendanceStatus, AttendanceUpsert},
        leave_request::{LeaveRequest, LeaveStatus},
    },
    store::SchoolStore,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub because: NonWorkday,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LeaveApplication {
    pub leave_id: u64,
    pub user_id: u64,
    pub applied: Vec<NaiveDate>,
    pub skipped: Vec<SkippedDate>,
}

/// Upserts one attendance row per workday in the leave range, keyed by
/// (user, date), so running it again changes nothing.
///
/// The first failed write aborts the run; rows written before it stay.
#[instrument(skip_all, fields(leave_id = leave.id, user_id = leave.user_id))]
pub async fn apply_approved_leave(
    store: &dyn SchoolStore,
    leave: &LeaveRequest,
) -> Result<LeaveApplication, ReconcileError> {
    if leave.status != LeaveStatus::Approved {
        return Err(ReconcileError::LeaveNotApproved(leave.id));
    }
    if leave.end_date < leave.start_date {
        return Err(ReconcileError::InvertedRange(leave.id));
    }

    let holidays = store.holidays_between(leave.start_date, leave.end_date).await?;
    let calendar = WorkdayCalendar::new(holidays);
    let status = AttendanceStatus::from(leave.leave_type);

    let mut outcome = LeaveApplication {
        leave_id: leave.id,
        user_id: leave.user_id,
        ..Default::default()
    };

    for date in dates_between(leave.start_date, leave.end_date) {
        if let Some(because) = calendar.non_workday(date) {
            outcome.skipped.push(SkippedDate { date, because });
            continue;
        }

        let entry = AttendanceUpsert {
            user_id: leave.user_id,
            date,
            status,
            source: AttendanceSource::Permission,
            notes: leave.reason.clone(),
        };

        if let Err(e) = store.upsert_attendance(&entry).await {
            warn!(error = %e, %date, applied = outcome.applied.len(), "Leave reconciliation aborted");
            return Err(e.into());
        }
        outcome.applied.push(date);
    }

    info!(
        applied = outcome.applied.len(),
        skipped = outcome.skipped.len(),
        "Leave applied to attendance"
    );
    Ok(outcome)
}
