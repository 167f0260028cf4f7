use std::{env, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::reconcile::reminder::{WINDOW_END_MINUTES, WINDOW_START_MINUTES};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Push delivery; both must be set for reminders to go out
    pub push_gateway_url: Option<String>,
    pub push_server_key: Option<String>,

    pub settings_cache_path: Option<PathBuf>,
    pub scheduler_enabled: bool,
    pub reminder_lead_minutes: i64,
    pub log_dir: String,
    pub run_migrations: bool,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

/// The in-process reminder fires `lead` minutes before the late cutoff, so the
/// lead has to land inside the reminder window or every run is skipped.
fn reminder_lead(lead: i64) -> Result<i64> {
    let window = WINDOW_START_MINUTES..=WINDOW_END_MINUTES;
    if window.contains(&lead) {
        Ok(lead)
    } else {
        Err(anyhow!("outside the reminder window {window:?}")).with_context(|| {
            format!("REMINDER_LEAD_MINUTES has an invalid value: {lead}")
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            push_gateway_url: optional("PUSH_GATEWAY_URL"),
            push_server_key: optional("PUSH_SERVER_KEY"),

            settings_cache_path: Some(PathBuf::from(
                optional("SETTINGS_CACHE_PATH")
                    .unwrap_or_else(|| "cache/settings.json".to_string()),
            )),
            scheduler_enabled: parsed("SCHEDULER_ENABLED", true)?,
            reminder_lead_minutes: reminder_lead(parsed("REMINDER_LEAD_MINUTES", 10)?)?,
            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            run_migrations: parsed("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_lead_must_fall_inside_the_window() {
        assert_eq!(reminder_lead(5).ok(), Some(5));
        assert_eq!(reminder_lead(10).ok(), Some(10));
        assert_eq!(reminder_lead(15).ok(), Some(15));

        for lead in [3, 4, 16, 20, 30, -10] {
            let err = reminder_lead(lead).unwrap_err();
            assert!(format!("{err:#}").contains("REMINDER_LEAD_MINUTES"));
        }
    }
}
