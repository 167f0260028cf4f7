//! Reconciliation jobs triggered by an external scheduler.
//!
//! Both endpoints answer 200 with the job outcome, including skips, and 500
//! when the run fails.

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    reconcile::{no_show, reminder},
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};
use tracing::info;

/// Record lessons that ended today without a teaching session
#[utoipa::path(
    post,
    path = "/jobs/mark-not-teaching",
    responses(
        (status = 200, description = "Job ran or was skipped", body = Object, example = json!({
            "status": "completed",
            "date": "2025-01-06",
            "checked": 4,
            "not_due": 0,
            "taught": 2,
            "excused": 1,
            "recorded": 1,
            "already_recorded": 0
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Job failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Jobs"
)]
pub async fn mark_not_teaching(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_system_or_admin()?;

    let settings = state.settings.resolve(state.store.as_ref()).await.settings;
    let outcome = no_show::detect_no_shows(state.store.as_ref(), &settings, state.clock.now())
        .await
        .map_err(AppError::from)?;

    info!(triggered_by = auth.user_id, ?outcome, "mark-not-teaching finished");
    Ok(HttpResponse::Ok().json(outcome))
}

/// Push a reminder to everyone who has not checked in yet
#[utoipa::path(
    post,
    path = "/jobs/attendance-reminder",
    responses(
        (status = 200, description = "Job ran or was skipped", body = Object, example = json!({
            "status": "skipped",
            "reason": "outside_reminder_window",
            "message": "Not within the reminder window"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Job failed, e.g. push credentials missing")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Jobs"
)]
pub async fn attendance_reminder(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_system_or_admin()?;

    let settings = state.settings.resolve(state.store.as_ref()).await.settings;
    let outcome = reminder::dispatch_attendance_reminders(
        state.store.as_ref(),
        state.notifier.as_deref(),
        &settings,
        state.clock.now(),
    )
    .await
    .map_err(AppError::from)?;

    info!(triggered_by = auth.user_id, ?outcome, "attendance-reminder finished");
    Ok(HttpResponse::Ok().json(outcome))
}

/// CORS preflight
pub async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}
