//! Portal configuration.
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | api_base | DURA__API_BASE | production backend | Base URL of the insights backend. |
//! | poll_interval_secs | DURA__POLL_INTERVAL_SECS | 60 | Seconds between insight polls (min 1). |
//! | request_timeout_secs | DURA__REQUEST_TIMEOUT_SECS | 10 | Per-request HTTP timeout. |
//! | login_page | DURA__LOGIN_PAGE | ../demo-dura-login.html | Redirect target when the session is invalid. |
//! | utc_offset_minutes | DURA__UTC_OFFSET_MINUTES | 0 | Offset used to display backend timestamps. |
//! | time_zone | DURA__TIME_ZONE | unset | IANA zone for timestamps, e.g. `Europe/Amsterdam`; wins over the offset. |
//! | snapshot_path | DURA__SNAPSHOT_PATH | unset | Host only: write the page HTML here after each render. |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PortalResult;
use crate::render::TimeDisplay;

pub const DEFAULT_API_BASE: &str = "https://dura-backend-production.up.railway.app";
pub const DEFAULT_LOGIN_PAGE: &str = "../demo-dura-login.html";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub api_base: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub login_page: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            login_page: DEFAULT_LOGIN_PAGE.to_string(),
            utc_offset_minutes: 0,
            time_zone: None,
            snapshot_path: None,
        }
    }
}

impl PortalConfig {
    /// Load config from file and environment. Precedence: `DURA__*` env > file named by
    /// `DURA_CONFIG` (default `config/portal`, any extension the `config` crate knows) > defaults.
    pub fn load() -> PortalResult<Self> {
        let config_path = std::env::var("DURA_CONFIG").unwrap_or_else(|_| "config/portal".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> PortalResult<Self> {
        let builder = config::Config::builder()
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS as i64)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("login_page", DEFAULT_LOGIN_PAGE)?
            .set_default("utc_offset_minutes", 0_i64)?;

        let path = Path::new(config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(config_path).required(false))
        };

        let built = builder
            .add_source(config::Environment::with_prefix("DURA").separator("__"))
            .build()?;

        let mut loaded: PortalConfig = built.try_deserialize()?;
        loaded.api_base = loaded.api_base.trim().trim_end_matches('/').to_string();
        Ok(loaded)
    }

    /// Poll cadence; never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Named zone when configured and known, otherwise the fixed offset.
    pub fn time_display(&self) -> TimeDisplay {
        self.time_zone
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .and_then(TimeDisplay::with_zone)
            .unwrap_or_else(|| TimeDisplay::with_offset_minutes(self.utc_offset_minutes))
    }
}
