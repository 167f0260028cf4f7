use crate::{
    api::date_param,
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest},
    notify::{self, PushMessage},
    reconcile,
    state::AppState,
    wib,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2025-01-06", format = "date", value_type = String)]
    pub start_date: String,
    #[schema(example = "2025-01-08", format = "date", value_type = String)]
    pub end_date: String,
    #[schema(example = "sakit")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Demam")]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requester (admins only; others always see their own)
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

fn decision_message(leave: &LeaveRequest) -> PushMessage {
    let verdict = match leave.status {
        LeaveStatus::Approved => "disetujui",
        LeaveStatus::Rejected => "ditolak",
        LeaveStatus::Pending => "diproses",
    };
    PushMessage {
        title: "Pengajuan Izin".to_string(),
        body: format!(
            "Pengajuan {} tanggal {} s/d {} {}.",
            leave.leave_type, leave.start_date, leave.end_date, verdict
        ),
        url: Some("/leave".to_string()),
        tag: Some(format!("leave-{}", leave.id)),
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_attendance_role()?;

    let start_date = wib::date_from_iso(&payload.start_date)
        .ok_or_else(|| AppError::BadRequest("Invalid start_date".into()))?;
    let end_date = wib::date_from_iso(&payload.end_date)
        .ok_or_else(|| AppError::BadRequest("Invalid end_date".into()))?;

    if start_date > end_date {
        return Err(AppError::BadRequest("start_date cannot be after end_date".into()).into());
    }

    let leave = state
        .store
        .insert_leave(&NewLeaveRequest {
            user_id: auth.user_id,
            leave_type: payload.leave_type,
            start_date,
            end_date,
            reason: payload
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        })
        .await
        .map_err(AppError::from)?;

    info!(leave_id = leave.id, user_id = auth.user_id, "Leave request submitted");
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approve leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and applied to attendance", body = Object, example = json!({
            "message": "Leave approved",
            "attendance": {
                "leave_id": 1,
                "user_id": 7,
                "applied": ["2025-01-06", "2025-01-07"],
                "skipped": [{"date": "2025-01-10", "because": {"kind": "friday"}}]
            }
        })),
        (status = 400, description = "Leave request not found or already rejected", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Attendance reconciliation failed part-way")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    let decided = state
        .store
        .decide_leave(leave_id, LeaveStatus::Approved, auth.user_id)
        .await
        .map_err(AppError::from)?;

    // An already approved request is re-applied; the upserts are keyed, so
    // this completes a run that failed part-way without touching finished days.
    let (leave, reapplied) = match decided {
        Some(leave) => (leave, false),
        None => match state.store.get_leave(leave_id).await.map_err(AppError::from)? {
            Some(leave) if leave.status == LeaveStatus::Approved => (leave, true),
            _ => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Leave request not found or already processed"
                })));
            }
        },
    };

    let applied = reconcile::leave::apply_approved_leave(state.store.as_ref(), &leave)
        .await
        .map_err(AppError::from)?;

    if reapplied {
        info!(leave_id, applied = applied.applied.len(), "Approved leave re-applied");
    } else {
        notify::notify_user(
            state.store.as_ref(),
            state.notifier.as_deref(),
            leave.user_id,
            &decision_message(&leave),
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if reapplied { "Leave re-applied" } else { "Leave approved" },
        "attendance": applied
    })))
}

/* =========================
Reject leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    let Some(leave) = state
        .store
        .decide_leave(leave_id, LeaveStatus::Rejected, auth.user_id)
        .await
        .map_err(AppError::from)?
    else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    };

    notify::notify_user(
        state.store.as_ref(),
        state.notifier.as_deref(),
        leave.user_id,
        &decision_message(&leave),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// Leave request details (admin or the requester)
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    match state.store.get_leave(leave_id).await.map_err(AppError::from)? {
        Some(leave) if auth.is_admin() || leave.user_id == auth.user_id => {
            Ok(HttpResponse::Ok().json(leave))
        }
        _ => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// Paginated leave list
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::BadRequest(format!("page {page} is out of range")))?;

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.parse::<LeaveStatus>()
                .map_err(|_| AppError::BadRequest(format!("Unknown status: {raw}")))?,
        ),
    };

    let user_id = if auth.is_admin() {
        query.user_id
    } else {
        Some(auth.user_id)
    };

    let (data, total) = state
        .store
        .list_leaves(&LeaveQuery {
            user_id,
            status,
            limit: per_page,
            offset,
        })
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[derive(Deserialize, IntoParams)]
pub struct CanTeachQuery {
    /// Date to check (defaults to today in WIB)
    pub date: Option<String>,
}

/// Whether a teacher may teach on a date, derived from approved leave
#[utoipa::path(
    get,
    path = "/api/teachers/{teacher_id}/can-teach",
    params(
        ("teacher_id" = u64, Path, description = "Teacher user ID"),
        CanTeachQuery
    ),
    responses(
        (status = 200, description = "Derived permission", body = Object, example = json!({
            "teacher_id": 7,
            "date": "2025-01-06",
            "can_teach": false
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn can_teach(
    _auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    query: web::Query<CanTeachQuery>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = path.into_inner();
    let date = date_param(query.date.as_deref(), wib::today(state.clock.now()))?;

    let allowed = crate::teaching::can_teach(state.store.as_ref(), teacher_id, date)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "teacher_id": teacher_id,
        "date": date,
        "can_teach": allowed
    })))
}
