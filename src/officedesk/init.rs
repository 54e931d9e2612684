use crate::api::DeskApi;
use crate::config::DeskConfig;
use crate::error::{DeskError, Result};
use crate::http::remote::ReqwestTransport;
use crate::http::HttpClient;
use crate::session::{FileTokenStore, Session};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the config directory (config file and token live there).
pub const HOME_ENV: &str = "OFFICEDESK_HOME";
/// Overrides the configured base URL for one run.
pub const BASE_URL_ENV: &str = "OFFICEDESK_BASE_URL";

pub const TOKEN_FILENAME: &str = "token";

pub struct DeskContext {
    pub api: DeskApi<ReqwestTransport>,
    pub config: DeskConfig,
    pub config_dir: PathBuf,
}

/// `$OFFICEDESK_HOME` when set, otherwise the platform config directory.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "officedesk", "officedesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| DeskError::Config("could not determine a config directory".into()))
}

pub fn initialize(config_dir: &Path) -> Result<DeskContext> {
    let mut config = DeskConfig::load(config_dir)?;
    if let Ok(url) = env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            config.set_base_url(&url)?;
        }
    }
    debug!(dir = %config_dir.display(), base_url = %config.base_url, "configuration loaded");

    let store = FileTokenStore::new(config_dir.join(TOKEN_FILENAME));
    let session = Session::new(store, config.login_route.clone());
    let transport = ReqwestTransport::new(&config.base_url, config.timeout())?;
    let api = DeskApi::new(HttpClient::new(transport, session), &config);

    Ok(DeskContext {
        api,
        config,
        config_dir: config_dir.to_path_buf(),
    })
}
