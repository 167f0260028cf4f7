//! Wall-clock driven reconciliation over attendance, leave and schedules.
//!
//! Each routine is a stateless pass: it reads rows, decides, writes, and
//! reports what it did. Expected "nothing to do" conditions come back as a
//! skip outcome, never as an error.

use serde::Serialize;

use crate::{calendar::NonWorkday, store::StoreError};

pub mod leave;
pub mod no_show;
pub mod reminder;

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Friday,
    Holiday,
    BeforeCheckOut,
    OutsideReminderWindow,
    EveryoneCheckedIn,
}

impl SkipReason {
    pub fn message(self) -> &'static str {
        match self {
            SkipReason::Friday => "Friday is not a school day",
            SkipReason::Holiday => "Today is a holiday",
            SkipReason::BeforeCheckOut => "Check-out time has not been reached yet",
            SkipReason::OutsideReminderWindow => "Not within the reminder window",
            SkipReason::EveryoneCheckedIn => "Everyone has already checked in",
        }
    }
}

impl From<&NonWorkday> for SkipReason {
    fn from(value: &NonWorkday) -> Self {
        match value {
            NonWorkday::Friday => SkipReason::Friday,
            NonWorkday::Holiday(_) => SkipReason::Holiday,
        }
    }
}

/// Result of a job run: either a skip with its reason or a report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome<R> {
    Skipped {
        reason: SkipReason,
        message: String,
    },
    Completed(R),
}

impl<R> JobOutcome<R> {
    pub fn skipped(reason: SkipReason) -> Self {
        JobOutcome::Skipped {
            reason,
            message: reason.message().to_string(),
        }
    }

    pub fn skipped_for(day: &NonWorkday) -> Self {
        let reason = SkipReason::from(day);
        let message = match day {
            NonWorkday::Holiday(name) => format!("Today is a holiday: {name}"),
            NonWorkday::Friday => reason.message().to_string(),
        };
        JobOutcome::Skipped { reason, message }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, JobOutcome::Skipped { .. })
    }

    pub fn report(&self) -> Option<&R> {
        match self {
            JobOutcome::Completed(r) => Some(r),
            JobOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("leave request {0} is not approved")]
    LeaveNotApproved(u64),
    #[error("leave request {0} ends before it starts")]
    InvertedRange(u64),
    #[error("push delivery credentials are not configured")]
    MissingPushCredentials,
}
