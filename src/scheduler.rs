//! In-process daily timers for the reminder and the no-show detector.
//!
//! Each loop resolves the settings, sleeps until the next precise fire time
//! in WIB, runs its job, and starts over. The HTTP job endpoints stay
//! available for external triggers.

use std::time::Duration as StdDuration;

use actix_web::web::Data;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{error, info, warn};

use crate::{
    model::settings::SchoolSettings,
    reconcile::{no_show, reminder},
    state::AppState,
    wib,
};

/// Delay after check-out before the detector runs.
const DETECTOR_GRACE_MINUTES: i64 = 1;

/// Next instant, strictly after `now`, at which the WIB wall clock reads `at`.
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = wib::today(now);
    let candidate = wib::from_wib(today.and_time(at));
    if candidate > now {
        candidate
    } else {
        wib::from_wib((today + Duration::days(1)).and_time(at))
    }
}

/// Reminder fires `lead_minutes` before the late cutoff.
pub fn reminder_time(settings: &SchoolSettings, lead_minutes: i64) -> NaiveTime {
    settings.late_time - Duration::minutes(lead_minutes)
}

pub fn detector_time(settings: &SchoolSettings) -> NaiveTime {
    settings.check_out_time + Duration::minutes(DETECTOR_GRACE_MINUTES)
}

/// Both fire times must stay on the same WIB day as the cutoff they follow;
/// a wrapped time would run the job on a day where it always skips.
pub fn check_fire_times(settings: &SchoolSettings, lead_minutes: i64) -> Result<(), String> {
    let (_, reminder_wrap) = settings
        .late_time
        .overflowing_sub_signed(Duration::minutes(lead_minutes));
    if reminder_wrap != 0 {
        return Err(format!(
            "late_time must be at least {lead_minutes} minutes after midnight"
        ));
    }
    let (_, detector_wrap) = settings
        .check_out_time
        .overflowing_add_signed(Duration::minutes(DETECTOR_GRACE_MINUTES));
    if detector_wrap != 0 {
        return Err(format!(
            "check_out_time must be at least {DETECTOR_GRACE_MINUTES} minute before midnight"
        ));
    }
    Ok(())
}

async fn sleep_until(state: &AppState, at: NaiveTime, job: &str) {
    let now = state.clock.now();
    let next = next_occurrence(now, at);
    let wait = (next - now).to_std().unwrap_or(StdDuration::ZERO);
    info!(job, next = %wib::to_wib(next), "Scheduled next run");
    actix_web::rt::time::sleep(wait).await;
}

pub fn spawn(state: Data<AppState>) {
    let reminder_state = state.clone();
    actix_web::rt::spawn(async move {
        loop {
            let settings = reminder_state
                .settings
                .resolve(reminder_state.store.as_ref())
                .await
                .settings;
            let at = reminder_time(&settings, reminder_state.reminder_lead_minutes);
            sleep_until(&reminder_state, at, "attendance-reminder").await;

            // Settings may have changed while sleeping
            let settings = reminder_state
                .settings
                .resolve(reminder_state.store.as_ref())
                .await
                .settings;
            let result = reminder::dispatch_attendance_reminders(
                reminder_state.store.as_ref(),
                reminder_state.notifier.as_deref(),
                &settings,
                reminder_state.clock.now(),
            )
            .await;
            match result {
                Ok(outcome) if outcome.is_skipped() => info!(?outcome, "Scheduled reminder skipped"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Scheduled reminder failed"),
            }
        }
    });

    actix_web::rt::spawn(async move {
        loop {
            let settings = state.settings.resolve(state.store.as_ref()).await.settings;
            sleep_until(&state, detector_time(&settings), "mark-not-teaching").await;

            let settings = state.settings.resolve(state.store.as_ref()).await.settings;
            match no_show::detect_no_shows(state.store.as_ref(), &settings, state.clock.now()).await {
                Ok(outcome) if outcome.is_skipped() => info!(?outcome, "Scheduled detection skipped"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Scheduled no-show detection failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wib_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        wib::from_wib(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn next_occurrence_is_later_today_when_ahead() {
        let now = wib_at(2025, 1, 6, 6, 0);
        let at = NaiveTime::from_hms_opt(7, 20, 0).unwrap();
        assert_eq!(next_occurrence(now, at), wib_at(2025, 1, 6, 7, 20));
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow_once_passed() {
        let at = NaiveTime::from_hms_opt(7, 20, 0).unwrap();
        assert_eq!(next_occurrence(wib_at(2025, 1, 6, 7, 20), at), wib_at(2025, 1, 7, 7, 20));
        assert_eq!(next_occurrence(wib_at(2025, 1, 6, 23, 59), at), wib_at(2025, 1, 7, 7, 20));
    }

    #[test]
    fn fire_times_may_not_cross_midnight() {
        let settings = SchoolSettings::default();
        assert!(check_fire_times(&settings, 10).is_ok());

        let early = SchoolSettings {
            late_time: NaiveTime::from_hms_opt(0, 5, 0).unwrap(),
            ..SchoolSettings::default()
        };
        assert!(check_fire_times(&early, 10).is_err());
        assert!(check_fire_times(&early, 5).is_ok());

        let late = SchoolSettings {
            check_out_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            ..SchoolSettings::default()
        };
        assert!(check_fire_times(&late, 10).is_err());

        let last_minute = SchoolSettings {
            check_out_time: NaiveTime::from_hms_opt(23, 58, 0).unwrap(),
            ..SchoolSettings::default()
        };
        assert!(check_fire_times(&last_minute, 10).is_ok());
    }

    #[test]
    fn fire_times_follow_settings() {
        let settings = SchoolSettings::default();
        assert_eq!(reminder_time(&settings, 10), NaiveTime::from_hms_opt(7, 20, 0).unwrap());
        assert_eq!(detector_time(&settings), NaiveTime::from_hms_opt(14, 1, 0).unwrap());
        assert!(reminder::in_window(wib::minutes_until(
            reminder_time(&settings, 10),
            settings.late_time
        )));
    }
}
