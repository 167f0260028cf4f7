use crate::{
    api::{attendance, holiday, jobs, leave_request, push, schedule, session, settings},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    http::Method,
    middleware::{DefaultHeaders, from_fn},
    web,
};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("limiter quota is non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes; /register checks the admin token itself
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    jobs_scope(cfg);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::resource("/attendance")
                    .route(web::get().to(attendance::list_attendance))
                    .route(web::put().to(attendance::check_out))
                    .route(web::post().to(attendance::check_in)),
            )
            .service(
                web::resource("/schedules")
                    .route(web::get().to(schedule::list_schedules))
                    .route(web::post().to(schedule::create_schedule)),
            )
            .service(web::resource("/sessions").route(web::post().to(session::start_session)))
            .service(web::resource("/no-teach").route(web::get().to(session::list_no_teach)))
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::resource("/teachers/{id}/can-teach")
                    .route(web::get().to(leave_request::can_teach)),
            )
            .service(web::resource("/push/subscribe").route(web::post().to(push::subscribe)))
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::put().to(settings::update_settings)),
            ),
    );
}

/// Job triggers for the external scheduler. Browser callers get CORS
/// headers and an immediate answer to preflight.
pub fn jobs_scope(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
                    .add((
                        "Access-Control-Allow-Headers",
                        "authorization, x-client-info, apikey, content-type",
                    )),
            )
            .service(
                web::resource("/mark-not-teaching")
                    .route(web::post().to(jobs::mark_not_teaching))
                    .route(web::method(Method::OPTIONS).to(jobs::preflight)),
            )
            .service(
                web::resource("/attendance-reminder")
                    .route(web::post().to(jobs::attendance_reminder))
                    .route(web::method(Method::OPTIONS).to(jobs::preflight)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// JOBS (external cron, System token)
//  └─ POST /jobs/mark-not-teaching, /jobs/attendance-reminder

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_builds_for_any_configured_rate() {
        for rate in [0, 1, 30, 60, 1000, 120_000] {
            build_limiter(rate);
        }
    }
}
