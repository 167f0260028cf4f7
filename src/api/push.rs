use crate::{
    auth::auth::AuthUser, error::AppError, model::push_subscription::NewPushSubscription,
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};

/// Register (or re-register) this device for push notifications
#[utoipa::path(
    post,
    path = "/api/push/subscribe",
    request_body = NewPushSubscription,
    responses(
        (status = 200, description = "Subscription saved", body = Object, example = json!({
            "message": "Subscribed",
            "id": 4
        })),
        (status = 400, description = "Invalid subscription"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Push"
)]
pub async fn subscribe(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewPushSubscription>,
) -> actix_web::Result<impl Responder> {
    if !payload.endpoint.starts_with("https://")
        || payload.p256dh.is_empty()
        || payload.auth.is_empty()
    {
        return Err(AppError::BadRequest("Invalid push subscription".into()).into());
    }

    let saved = state
        .store
        .save_push_subscription(auth.user_id, &payload)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Subscribed",
        "id": saved.id
    })))
}
