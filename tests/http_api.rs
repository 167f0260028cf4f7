mod common;

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use chrono::NaiveDate;
use common::{date, hm, leave, profile, schedule, subscribe};
use sekolah::{
    auth::jwt::generate_access_token,
    config::Config,
    model::{leave_request::LeaveStatus, role::Role},
    routes,
    settings::SettingsResolver,
    state::AppState,
    store::{MemoryStore, SchoolStore},
    wib::FixedClock,
};
use serde_json::Value;

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 60,
        rate_refresh_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
        push_gateway_url: None,
        push_server_key: None,
        settings_cache_path: None,
        scheduler_enabled: false,
        reminder_lead_minutes: 10,
        log_dir: "logs".to_string(),
        run_migrations: false,
    }
}

fn token(user_id: u64, role: Role) -> String {
    generate_access_token(user_id, format!("user{user_id}"), role.id(), SECRET, 900).unwrap()
}

fn state_at(store: Arc<MemoryStore>, day: NaiveDate, h: u32, m: u32) -> web::Data<AppState> {
    web::Data::new(AppState {
        store,
        notifier: None,
        clock: Arc::new(FixedClock::at_wib(day, hm(h, m))),
        settings: SettingsResolver::new(None),
        reminder_lead_minutes: 10,
    })
}

macro_rules! app {
    ($state:expr) => {{
        let config = test_config();
        test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data($state)
                .configure(move |cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

/// Bearer token plus a peer address for the per-IP rate limiter.
fn authed(req: test::TestRequest, user_id: u64, role: Role) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token(user_id, role))))
        .peer_addr("127.0.0.1:40000".parse().unwrap())
}

#[actix_web::test]
async fn job_preflight_answers_immediately_with_cors() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(state_at(store, date(2025, 1, 6), 14, 5));

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/jobs/mark-not-teaching")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("Access-Control-Allow-Origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[actix_web::test]
async fn jobs_require_a_system_or_admin_token() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(state_at(store, date(2025, 1, 6), 14, 5));

    let anonymous = test::TestRequest::post()
        .uri("/jobs/mark-not-teaching")
        .to_request();
    assert_eq!(
        test::call_service(&app, anonymous).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let teacher = authed(
        test::TestRequest::post().uri("/jobs/mark-not-teaching"),
        7,
        Role::Teacher,
    ).to_request();
    assert_eq!(
        test::call_service(&app, teacher).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn mark_not_teaching_reports_what_it_recorded() {
    let store = Arc::new(MemoryStore::new());
    schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    let app = app!(state_at(store.clone(), date(2025, 1, 6), 14, 5));

    let req = authed(
        test::TestRequest::post().uri("/jobs/mark-not-teaching"),
        99,
        Role::System,
    ).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["recorded"], 1);
    assert_eq!(store.no_teach_count().await, 1);
}

#[actix_web::test]
async fn a_skip_is_still_a_success() {
    let store = Arc::new(MemoryStore::new());
    // Friday
    let app = app!(state_at(store, date(2025, 1, 10), 14, 5));

    let req = authed(
        test::TestRequest::post().uri("/jobs/mark-not-teaching"),
        1,
        Role::Admin,
    ).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "skipped");
    assert_eq!(body["reason"], "friday");
}

#[actix_web::test]
async fn reminder_without_push_credentials_is_a_server_error() {
    let store = Arc::new(MemoryStore::new());
    store.add_profile(profile(8, Role::Staff)).await;
    subscribe(&store, 8, "https://push.test/staff").await;
    let app = app!(state_at(store, date(2025, 1, 6), 7, 20));

    let req = authed(
        test::TestRequest::post().uri("/jobs/attendance-reminder"),
        99,
        Role::System,
    ).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "push delivery credentials are not configured");
}

#[actix_web::test]
async fn approving_leave_fills_attendance() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_leave(leave(5, 7, date(2025, 1, 9), date(2025, 1, 11), LeaveStatus::Pending))
        .await;
    let app = app!(state_at(store.clone(), date(2025, 1, 8), 9, 0));

    let req = authed(
        test::TestRequest::put().uri("/api/leave/5/approve"),
        1,
        Role::Admin,
    ).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["attendance"]["applied"].as_array().map(Vec::len), Some(2));
    assert!(store.attendance_for(7, date(2025, 1, 10)).await.is_none());

    let decided = store.get_leave(5).await.unwrap().unwrap();
    assert_eq!(decided.status, LeaveStatus::Approved);
    assert_eq!(decided.reviewed_by, Some(1));

    // Approved requests can no longer be rejected
    let reject = authed(
        test::TestRequest::put().uri("/api/leave/5/reject"),
        1,
        Role::Admin,
    ).to_request();
    assert_eq!(
        test::call_service(&app, reject).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn approving_again_completes_a_partial_application() {
    let store = Arc::new(MemoryStore::new());
    // Monday 6 through Thursday 9 January
    store
        .add_leave(leave(6, 7, date(2025, 1, 6), date(2025, 1, 9), LeaveStatus::Pending))
        .await;
    store.fail_attendance_on(date(2025, 1, 8)).await;
    let app = app!(state_at(store.clone(), date(2025, 1, 5), 9, 0));

    let first = authed(
        test::TestRequest::put().uri("/api/leave/6/approve"),
        1,
        Role::Admin,
    ).to_request();
    assert_eq!(
        test::call_service(&app, first).await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        store.get_leave(6).await.unwrap().unwrap().status,
        LeaveStatus::Approved
    );
    assert!(store.attendance_for(7, date(2025, 1, 8)).await.is_none());

    store.clear_attendance_failures().await;
    let retry = authed(
        test::TestRequest::put().uri("/api/leave/6/approve"),
        1,
        Role::Admin,
    ).to_request();
    let resp = test::call_service(&app, retry).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Leave re-applied");
    assert_eq!(body["attendance"]["applied"].as_array().map(Vec::len), Some(4));
    assert!(store.attendance_for(7, date(2025, 1, 8)).await.is_some());
    assert!(store.attendance_for(7, date(2025, 1, 9)).await.is_some());
    assert_eq!(store.attendance_count().await, 4);
}

#[actix_web::test]
async fn huge_leave_page_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(state_at(store, date(2025, 1, 6), 9, 0));

    let req = authed(
        test::TestRequest::get().uri("/api/leave?page=18446744073709551615&per_page=100"),
        1,
        Role::Admin,
    ).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let last = authed(
        test::TestRequest::get().uri("/api/leave?page=18446744073709551615&per_page=1"),
        1,
        Role::Admin,
    ).to_request();
    let resp = test::call_service(&app, last).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["page"], u64::MAX);
    assert_eq!(body["total"], 0);
}

#[actix_web::test]
async fn check_in_after_the_cutoff_is_late() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(state_at(store.clone(), date(2025, 1, 6), 7, 45));

    let req = authed(test::TestRequest::post().uri("/api/attendance"), 7, Role::Teacher).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "late");
    assert_eq!(body["check_in"], "07:45");

    let twice = authed(test::TestRequest::post().uri("/api/attendance"), 7, Role::Teacher).to_request();
    assert_eq!(
        test::call_service(&app, twice).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn teachers_on_leave_cannot_start_a_session() {
    let store = Arc::new(MemoryStore::new());
    let slot = schedule(&store, 7, "Senin", hm(8, 0), hm(10, 0)).await;
    store
        .add_leave(leave(3, 7, date(2025, 1, 6), date(2025, 1, 6), LeaveStatus::Approved))
        .await;
    let app = app!(state_at(store.clone(), date(2025, 1, 6), 8, 5));

    let req = authed(
        test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(serde_json::json!({ "schedule_id": slot.id })),
        7,
        Role::Teacher,
    ).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
    assert!(!store.session_exists(slot.id, date(2025, 1, 6)).await.unwrap());
}

#[actix_web::test]
async fn settings_whose_jobs_would_cross_midnight_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = app!(state_at(store.clone(), date(2025, 1, 6), 9, 0));

    let req = authed(
        test::TestRequest::put().uri("/api/settings").set_json(serde_json::json!({
            "school_name": "SMA Negeri 1",
            "check_in_time": "06:30",
            "late_time": "07:30",
            "check_out_time": "23:59"
        })),
        1,
        Role::Admin,
    ).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert!(store.load_settings().await.unwrap().is_none());

    let ok = authed(
        test::TestRequest::put().uri("/api/settings").set_json(serde_json::json!({
            "school_name": "SMA Negeri 1",
            "check_in_time": "06:30",
            "late_time": "07:15",
            "check_out_time": "15:00"
        })),
        1,
        Role::Admin,
    ).to_request();
    assert_eq!(test::call_service(&app, ok).await.status(), StatusCode::OK);
    assert!(store.load_settings().await.unwrap().is_some());
}
