use crate::api::holiday::CreateHoliday;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::schedule::CreateSchedule;
use crate::api::session::StartSession;
use crate::api::settings::UpdateSettings;
use crate::model::attendance::{AttendanceRecord, AttendanceSource, AttendanceStatus};
use crate::model::holiday::Holiday;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::push_subscription::NewPushSubscription;
use crate::model::schedule::{NoTeachRecord, Schedule, TeachingSession};
use crate::model::settings::SchoolSettings;
use crate::models::{LoginReqDto, UserReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sekolah Attendance API",
        version = "1.0.0",
        description = r#"
## School Attendance System

Backend for daily attendance of teachers and staff, leave requests, weekly
teaching schedules and push reminders. All times are WIB (UTC+7).

### 🔹 Key Features
- **Attendance**: daily check-in and check-out, `late` after the configured cutoff
- **Leave**: request, approve and reject; approval fills attendance for every school day in range
- **Schedules**: weekly lesson slots and per-day teaching sessions
- **Jobs**: no-show detection after check-out and reminders before the late cutoff

Fridays and declared holidays are not school days.

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication**. Job endpoints
accept System or Admin tokens only.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::can_teach,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,

        crate::api::schedule::create_schedule,
        crate::api::schedule::list_schedules,
        crate::api::session::start_session,
        crate::api::session::list_no_teach,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::push::subscribe,
        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::jobs::mark_not_teaching,
        crate::api::jobs::attendance_reminder
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            LeaveFilter,
            LeaveListResponse,
            CreateLeave,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceSource,
            CreateSchedule,
            Schedule,
            StartSession,
            TeachingSession,
            NoTeachRecord,
            CreateHoliday,
            Holiday,
            NewPushSubscription,
            SchoolSettings,
            UpdateSettings
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and account creation"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Schedule", description = "Teaching schedules, sessions and no-shows"),
        (name = "Holiday", description = "School holiday calendar"),
        (name = "Push", description = "Push notification subscriptions"),
        (name = "Settings", description = "School-wide attendance cutoffs"),
        (name = "Jobs", description = "Reconciliation jobs for the external scheduler"),
    )
)]
pub struct ApiDoc;
