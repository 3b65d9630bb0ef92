use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8089;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_MEDIA_SERVER_URL: &str = "http://localhost:32400";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STRATEGY_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;
pub const SCHEDULES_FILE: &str = "schedules.json";

/// Top-level config (preroll.toml + PREROLL_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrerollConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub media_server: MediaServerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// `Authorization: Bearer <token>` required on operator routes.
    Token,
    /// Open access. Use only on trusted networks.
    None,
}

/// Connection parameters for the remote media server's control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaServerConfig {
    #[serde(default = "default_media_server_url")]
    pub url: String,
    /// Access token sent as `X-Plex-Token`. Empty disables remote sync.
    #[serde(default)]
    pub token: String,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound for one strategy, which may issue several requests.
    #[serde(default = "default_strategy_timeout")]
    pub strategy_timeout_secs: u64,
    #[serde(default = "default_client_identifier")]
    pub client_identifier: String,
    #[serde(default = "default_product")]
    pub product: String,
}

impl Default for MediaServerConfig {
    fn default() -> Self {
        Self {
            url: default_media_server_url(),
            token: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            strategy_timeout_secs: DEFAULT_STRATEGY_TIMEOUT_SECS,
            client_identifier: default_client_identifier(),
            product: default_product(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory; each subdirectory is one category.
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
    /// Base URL under which the media server can reach this process's
    /// `/files/{category}/{file}` route. Enables URL-form pools.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn schedules_path(&self) -> PathBuf {
        self.data_dir.join(SCHEDULES_FILE)
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_media_server_url() -> String {
    DEFAULT_MEDIA_SERVER_URL.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_strategy_timeout() -> u64 {
    DEFAULT_STRATEGY_TIMEOUT_SECS
}
fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}
fn default_client_identifier() -> String {
    "preroll-rotator".to_string()
}
fn default_product() -> String {
    "Preroll Rotator".to_string()
}
fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}
fn default_data_dir() -> PathBuf {
    home_dir().join(".preroll")
}
fn default_library_path() -> PathBuf {
    default_data_dir().join("prerolls")
}

impl PrerollConfig {
    /// Load config from a TOML file with PREROLL_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g. `PREROLL_MEDIA_SERVER__TOKEN`.
    /// A missing file is not an error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PREROLL_").split("__"))
            .extract()
            .map_err(|e| crate::error::PrerollError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    default_data_dir()
        .join("preroll.toml")
        .to_string_lossy()
        .into_owned()
}
