//! Layered resolution of school settings: remote → last known → default.

use std::path::PathBuf;

use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{model::settings::SchoolSettings, store::SchoolStore};

const CACHE_KEY: &str = "school";

/// Which layer answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSource {
    Remote,
    Cache,
    Default,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    #[serde(flatten)]
    pub settings: SchoolSettings,
    pub source: SettingsSource,
}

/// The last known copy lives in memory and, when a path is set, in a JSON
/// file so it survives restarts while the database is unreachable.
pub struct SettingsResolver {
    last_known: Cache<&'static str, SchoolSettings>,
    cache_path: Option<PathBuf>,
}

impl SettingsResolver {
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        Self {
            last_known: Cache::builder().max_capacity(1).build(),
            cache_path,
        }
    }

    pub async fn resolve(&self, store: &dyn SchoolStore) -> ResolvedSettings {
        match store.load_settings().await {
            Ok(Some(settings)) => {
                self.remember(&settings).await;
                return ResolvedSettings {
                    settings,
                    source: SettingsSource::Remote,
                };
            }
            Ok(None) => debug!("No settings row, falling back"),
            Err(e) => warn!(error = %e, "Failed to load settings, falling back"),
        }

        if let Some(settings) = self.last_known.get(&CACHE_KEY).await {
            return ResolvedSettings {
                settings,
                source: SettingsSource::Cache,
            };
        }

        if let Some(settings) = self.read_cache_file().await {
            self.last_known.insert(CACHE_KEY, settings.clone()).await;
            return ResolvedSettings {
                settings,
                source: SettingsSource::Cache,
            };
        }

        ResolvedSettings {
            settings: SchoolSettings::default(),
            source: SettingsSource::Default,
        }
    }

    /// Stores new settings remotely, then refreshes both cache layers.
    pub async fn update(
        &self,
        store: &dyn SchoolStore,
        settings: &SchoolSettings,
    ) -> crate::store::StoreResult<()> {
        store.save_settings(settings).await?;
        self.remember(settings).await;
        Ok(())
    }

    async fn remember(&self, settings: &SchoolSettings) {
        self.last_known.insert(CACHE_KEY, settings.clone()).await;

        let Some(path) = &self.cache_path else {
            return;
        };
        let body = match serde_json::to_vec_pretty(settings) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Failed to serialize settings cache");
                return;
            }
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                warn!(error = %e, path = %dir.display(), "Failed to create settings cache dir");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(path, body).await {
            warn!(error = %e, path = %path.display(), "Failed to write settings cache");
        }
    }

    async fn read_cache_file(&self) -> Option<SchoolSettings> {
        let path = self.cache_path.as_ref()?;
        let raw = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring unreadable settings cache");
                None
            }
        }
    }
}
