use std::sync::Arc;

use crate::{notify::Notifier, settings::SettingsResolver, store::SchoolStore, wib::Clock};

/// Shared handles for handlers and background jobs.
pub struct AppState {
    pub store: Arc<dyn SchoolStore>,
    /// `None` when push delivery credentials are not configured.
    pub notifier: Option<Arc<dyn Notifier>>,
    pub clock: Arc<dyn Clock>,
    pub settings: SettingsResolver,
    pub reminder_lead_minutes: i64,
}
