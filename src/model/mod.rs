pub mod attendance;
pub mod holiday;
pub mod leave_request;
pub mod push_subscription;
pub mod role;
pub mod schedule;
pub mod settings;
pub mod user;
