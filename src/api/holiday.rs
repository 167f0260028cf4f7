use crate::{auth::auth::AuthUser, error::AppError, state::AppState, wib};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct HolidayRange {
    /// Inclusive start, defaults to 1 January of the current year
    pub from: Option<String>,
    /// Inclusive end, defaults to 31 December of the current year
    pub to: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2025-03-31", format = "date", value_type = String)]
    pub date: String,
    #[schema(example = "Idul Fitri")]
    pub name: String,
}

/// Holidays within a date range
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayRange),
    responses(
        (status = 200, description = "Holidays in range", body = [Holiday]),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<HolidayRange>,
) -> actix_web::Result<impl Responder> {
    let year = wib::today(state.clock.now()).year();
    let year_start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);

    let from = super::date_param(query.from.as_deref(), year_start)?;
    let to = super::date_param(query.to.as_deref(), year_end)?;
    if from > to {
        return Err(AppError::BadRequest("from cannot be after to".into()).into());
    }

    let holidays = state
        .store
        .holidays_between(from, to)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Declare a holiday (Admin)
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "A holiday already exists on that date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = wib::date_from_iso(&payload.date)
        .ok_or_else(|| AppError::BadRequest("Invalid date".into()))?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()).into());
    }

    let holiday = state
        .store
        .insert_holiday(date, name)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Conflict(format!("A holiday already exists on {date}")))?;

    tracing::info!(holiday_id = holiday.id, %date, "Holiday created");
    Ok(HttpResponse::Created().json(holiday))
}

/// Remove a holiday (Admin)
#[utoipa::path(
    delete,
    path = "/api/holidays/{holiday_id}",
    params(
        ("holiday_id" = u64, Path, description = "Holiday ID")
    ),
    responses(
        (status = 204, description = "Holiday deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Holiday not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let holiday_id = path.into_inner();
    if !state
        .store
        .delete_holiday(holiday_id)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::NotFound("Holiday not found".into()).into());
    }

    Ok(HttpResponse::NoContent().finish())
}
