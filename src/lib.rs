//! School attendance backend: check-in, leave, teaching schedules and the
//! daily reconciliation jobs that keep them consistent. Times are WIB.

pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod routes;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod store;
pub mod teaching;
pub mod wib;
