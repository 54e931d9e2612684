use crate::entities::EntityKind;
use crate::error::{DeskError, Result};
use crate::model::IdKey;
use crate::resource::{FetchFailurePolicy, MergeStrategy, ResourceOptions};
use crate::service::Endpoints;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Keys accepted by `officedesk config`.
pub const CONFIG_KEYS: [&str; 3] = ["base-url", "timeout", "login-route"];

/// Per-entity overrides; anything left out falls back to the entity preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_failure: Option<FetchFailurePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_key: Option<String>,

    /// How long the success flag stays up after a mutation, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_ttl_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
}

/// Configuration for officedesk, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeskConfig {
    /// Root URL of the REST backend; endpoint paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Where a 401 sends the user
    #[serde(default = "default_login_route")]
    pub login_route: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<EntityKind, ResourceConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            login_route: default_login_route(),
            resources: BTreeMap::new(),
        }
    }
}

impl DeskConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: DeskConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// Accepts only http(s) URLs; a trailing slash is dropped.
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeskError::Config(format!(
                "base url must start with http:// or https://, got '{}'",
                url
            )));
        }
        self.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoints_for(&self, kind: EntityKind) -> Endpoints {
        self.resources
            .get(&kind)
            .and_then(|r| r.endpoints.clone())
            .unwrap_or_else(|| kind.endpoints())
    }

    pub fn options_for(&self, kind: EntityKind) -> ResourceOptions {
        let overrides = self.resources.get(&kind).cloned().unwrap_or_default();
        ResourceOptions {
            id_key: overrides
                .id_key
                .map(IdKey::new)
                .unwrap_or_else(|| kind.id_key()),
            merge_strategy: overrides.merge_strategy.unwrap_or_default(),
            fetch_failure: overrides.fetch_failure.unwrap_or_default(),
            success_ttl: overrides.success_ttl_ms.map(Duration::from_millis),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "base-url" | "base_url" => Some(self.base_url.clone()),
            "timeout" | "timeout_secs" => Some(self.timeout_secs.to_string()),
            "login-route" | "login_route" => Some(self.login_route.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base-url" | "base_url" => self.set_base_url(value),
            "timeout" | "timeout_secs" => {
                let secs: u64 = value.trim().parse().map_err(|_| {
                    DeskError::Config(format!("timeout must be a whole number of seconds, got '{}'", value))
                })?;
                if secs == 0 {
                    return Err(DeskError::Config("timeout must be at least 1 second".into()));
                }
                self.timeout_secs = secs;
                Ok(())
            }
            "login-route" | "login_route" => {
                let route = value.trim();
                self.login_route = if route.starts_with('/') {
                    route.to_string()
                } else {
                    format!("/{}", route)
                };
                Ok(())
            }
            other => Err(DeskError::Config(format!(
                "unknown config key '{}', expected one of: {}",
                other,
                CONFIG_KEYS.join(", ")
            ))),
        }
    }
}
