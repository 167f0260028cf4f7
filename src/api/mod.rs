use chrono::NaiveDate;

use crate::{error::AppError, wib};

pub mod attendance;
pub mod holiday;
pub mod jobs;
pub mod leave_request;
pub mod push;
pub mod schedule;
pub mod session;
pub mod settings;

/// Parses an optional ISO date query value, defaulting to `fallback`.
pub(crate) fn date_param(raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate, AppError> {
    match raw {
        None => Ok(fallback),
        Some(s) => wib::date_from_iso(s)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {s}"))),
    }
}
