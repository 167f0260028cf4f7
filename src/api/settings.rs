use crate::{
    auth::auth::AuthUser, error::AppError, model::settings::SchoolSettings, state::AppState, wib,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateSettings {
    #[schema(example = "SMA Negeri 1")]
    pub school_name: String,
    /// `HH:MM` or `HH:MM:SS`
    #[schema(example = "06:30")]
    pub check_in_time: String,
    #[schema(example = "07:30")]
    pub late_time: String,
    #[schema(example = "14:00")]
    pub check_out_time: String,
}

fn clock_field(name: &str, raw: &str) -> Result<chrono::NaiveTime, AppError> {
    wib::parse_clock(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid {name}: {raw}")))
}

/// Current school settings and which layer supplied them
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Resolved settings", body = Object, example = json!({
            "school_name": "SMA Negeri 1",
            "check_in_time": "06:30:00",
            "late_time": "07:30:00",
            "check_out_time": "14:00:00",
            "source": "remote"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let resolved = state.settings.resolve(state.store.as_ref()).await;
    Ok(HttpResponse::Ok().json(resolved))
}

/// Replace school settings (Admin)
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Settings saved", body = SchoolSettings),
        (status = 400, description = "Invalid times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<UpdateSettings>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let settings = SchoolSettings {
        school_name: payload.school_name.trim().to_string(),
        check_in_time: clock_field("check_in_time", &payload.check_in_time)?,
        late_time: clock_field("late_time", &payload.late_time)?,
        check_out_time: clock_field("check_out_time", &payload.check_out_time)?,
    };

    if !(settings.check_in_time <= settings.late_time
        && settings.late_time < settings.check_out_time)
    {
        return Err(AppError::BadRequest(
            "Expected check_in_time <= late_time < check_out_time".into(),
        )
        .into());
    }

    crate::scheduler::check_fire_times(&settings, state.reminder_lead_minutes)
        .map_err(AppError::BadRequest)?;

    state
        .settings
        .update(state.store.as_ref(), &settings)
        .await
        .map_err(AppError::from)?;

    tracing::info!(updated_by = auth.user_id, "School settings updated");
    Ok(HttpResponse::Ok().json(settings))
}
