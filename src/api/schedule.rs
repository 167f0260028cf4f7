use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{role::Role, schedule::NewSchedule},
    state::AppState,
    wib,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateSchedule {
    #[schema(example = 7)]
    pub teacher_id: u64,
    #[schema(example = "X-IPA-1")]
    pub class_name: String,
    #[schema(example = "Matematika")]
    pub subject: String,
    /// Indonesian day name (Senin..Minggu)
    #[schema(example = "Senin")]
    pub day_of_week: String,
    #[schema(example = "08:00")]
    pub start_time: String,
    #[schema(example = "09:30")]
    pub end_time: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ScheduleFilter {
    /// Indonesian day name
    pub day: Option<String>,
    pub teacher_id: Option<u64>,
}

/// Create a weekly schedule slot (Admin)
#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateSchedule,
    responses(
        (status = 201, description = "Schedule created", body = Schedule),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn create_schedule(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let day = wib::parse_day_name(&payload.day_of_week)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown day: {}", payload.day_of_week)))?;
    let start_time = wib::parse_clock(&payload.start_time)
        .ok_or_else(|| AppError::BadRequest("Invalid start_time".into()))?;
    let end_time = wib::parse_clock(&payload.end_time)
        .ok_or_else(|| AppError::BadRequest("Invalid end_time".into()))?;

    if start_time >= end_time {
        return Err(AppError::BadRequest("start_time must be before end_time".into()).into());
    }
    if payload.class_name.trim().is_empty() || payload.subject.trim().is_empty() {
        return Err(AppError::BadRequest("class_name and subject are required".into()).into());
    }

    match state
        .store
        .get_profile(payload.teacher_id)
        .await
        .map_err(AppError::from)?
    {
        Some(profile) if profile.role == Role::Teacher && profile.is_active => {}
        _ => {
            return Err(AppError::BadRequest("teacher_id is not an active teacher".into()).into());
        }
    }

    let schedule = state
        .store
        .insert_schedule(&NewSchedule {
            teacher_id: payload.teacher_id,
            class_name: payload.class_name.trim().to_string(),
            subject: payload.subject.trim().to_string(),
            day_of_week: wib::weekday_name(day).to_string(),
            start_time,
            end_time,
        })
        .await
        .map_err(AppError::from)?;

    tracing::info!(schedule_id = schedule.id, created_by = auth.user_id, "Schedule created");
    Ok(HttpResponse::Created().json(schedule))
}

/// List schedules, optionally by day and teacher
#[utoipa::path(
    get,
    path = "/api/schedules",
    params(ScheduleFilter),
    responses(
        (status = 200, description = "Matching schedules", body = [Schedule]),
        (status = 400, description = "Unknown day"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn list_schedules(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ScheduleFilter>,
) -> actix_web::Result<impl Responder> {
    let day = match query.day.as_deref() {
        None => None,
        Some(raw) => Some(wib::weekday_name(
            wib::parse_day_name(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown day: {raw}")))?,
        )),
    };

    let schedules = state
        .store
        .list_schedules(day, query.teacher_id)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(schedules))
}
