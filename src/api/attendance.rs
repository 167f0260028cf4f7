use crate::{
    api::date_param,
    auth::auth::AuthUser,
    calendar::WorkdayCalendar,
    error::AppError,
    model::attendance::AttendanceStatus,
    state::AppState,
    wib,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "status": "hadir",
            "check_in": "07:12"
        })),
        (status = 400, description = "Already checked in today or not a school day", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_attendance_role()?;

    let now = state.clock.now();
    let today = wib::today(now);
    let time = wib::current_time(now);

    let holidays = state
        .store
        .holidays_between(today, today)
        .await
        .map_err(AppError::from)?;
    if let Some(day) = WorkdayCalendar::new(holidays).non_workday(today) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Today is not a school day",
            "because": day
        })));
    }

    let settings = state.settings.resolve(state.store.as_ref()).await.settings;
    let status = if time > settings.late_time {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Hadir
    };

    let inserted = state
        .store
        .insert_check_in(auth.user_id, today, time, status)
        .await
        .map_err(AppError::from)?;

    if !inserted {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already checked in today"
        })));
    }

    tracing::info!(user_id = auth.user_id, %status, "Checked in");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "status": status,
        "check_in": wib::format_hhmm(time)
    })))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_attendance_role()?;

    let now = state.clock.now();
    let updated = state
        .store
        .record_check_out(auth.user_id, wib::today(now), wib::current_time(now))
        .await
        .map_err(AppError::from)?;

    if !updated {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// ISO date, defaults to today in WIB
    pub date: Option<String>,
}

/// Attendance rows for one day (Admin)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance rows for the date", body = [AttendanceRecord]),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = date_param(query.date.as_deref(), wib::today(state.clock.now()))?;
    let rows = state.store.attendance_on(date).await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}
