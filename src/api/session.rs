use crate::{
    api::date_param,
    auth::auth::AuthUser,
    error::AppError,
    state::AppState,
    teaching, wib,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct StartSession {
    #[schema(example = 12)]
    pub schedule_id: u64,
}

/// Start today's teaching session for a schedule slot
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = StartSession,
    responses(
        (status = 201, description = "Session started", body = TeachingSession),
        (status = 400, description = "Schedule is not for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your schedule, or on approved leave"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "Session already started")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn start_session(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<StartSession>,
) -> actix_web::Result<impl Responder> {
    let schedule = state
        .store
        .get_schedule(payload.schedule_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Schedule not found".into()))?;

    if schedule.teacher_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Forbidden("Not your schedule".into()).into());
    }

    let now = state.clock.now();
    let today = wib::today(now);

    if schedule.day_of_week != wib::day_name_of(today) {
        return Err(AppError::BadRequest(format!(
            "Schedule is for {}, today is {}",
            schedule.day_of_week,
            wib::day_name_of(today)
        ))
        .into());
    }

    if !teaching::can_teach(state.store.as_ref(), schedule.teacher_id, today)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::Forbidden("Teacher is on approved leave today".into()).into());
    }

    let session = state
        .store
        .start_session(&schedule, today, now)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Conflict("Session already started".into()))?;

    tracing::info!(
        schedule_id = schedule.id,
        teacher_id = schedule.teacher_id,
        "Teaching session started"
    );
    Ok(HttpResponse::Created().json(session))
}

#[derive(Deserialize, IntoParams)]
pub struct NoTeachQuery {
    /// ISO date, defaults to today in WIB
    pub date: Option<String>,
}

/// No-teach records for a date
#[utoipa::path(
    get,
    path = "/api/no-teach",
    params(NoTeachQuery),
    responses(
        (status = 200, description = "Recorded no-shows", body = [NoTeachRecord]),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn list_no_teach(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<NoTeachQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = date_param(query.date.as_deref(), wib::today(state.clock.now()))?;
    let records = state.store.no_teach_on(date).await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(records))
}
