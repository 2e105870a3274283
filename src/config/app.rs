// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "FEAR_GREED_CONFIG";

const ENV_BASE_URL: &str = "FEAR_GREED_BASE_URL";
const ENV_DATA_DIR: &str = "FEAR_GREED_DATA_DIR";
const ENV_BRIDGE_ADDR: &str = "FEAR_GREED_BRIDGE_ADDR";
const ENV_REFRESH_SECS: &str = "FEAR_GREED_REFRESH_SECS";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_refresh_interval_secs() -> u64 {
    60 * 60
}
fn default_stale_after_secs() -> u64 {
    60 * 60
}
fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fear-greed-menubar")
}
fn default_bridge_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream index API root, without the `/api/v1/...` path.
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub refresh_interval_secs: u64,
    /// Cached readings older than this are flagged as stale on display.
    pub stale_after_secs: u64,
    /// Holds `settings.json` and `last_reading.json`.
    pub data_dir: PathBuf,
    pub bridge_addr: SocketAddr,
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            refresh_interval_secs: default_refresh_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
            data_dir: default_data_dir(),
            bridge_addr: default_bridge_addr(),
            metrics_enabled: false,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolution order:
    /// 1) $FEAR_GREED_CONFIG (must exist)
    /// 2) config/app.toml if present
    /// 3) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let base = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Ok(dir) = env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = env::var(ENV_BRIDGE_ADDR) {
            self.bridge_addr = addr
                .parse()
                .with_context(|| format!("{ENV_BRIDGE_ADDR} is not a socket address: {addr}"))?;
        }
        if let Ok(secs) = env::var(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REFRESH_SECS} is not a number: {secs}"))?;
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = default_refresh_interval_secs();
        }
        if self.stale_after_secs == 0 {
            self.stale_after_secs = default_stale_after_secs();
        }
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            default_base_url()
        } else {
            trimmed.to_string()
        };
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}
