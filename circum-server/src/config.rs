//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CIRCUM_BIND` | `127.0.0.1:3000` |
//! | `CIRCUM_SEED` | `data/seed.json` (a directory means CSV import) |
//! | `CIRCUM_RESEED_SECS` | unset: no periodic reseed |
//! | `EAV_BASE_URL` | unset: remote endpoints answer 503 |
//! | `EAV_STATIONS` | `data/eav_stations.json` |
//! | `EAV_TIMEOUT_SECS` | client default |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::eav::EavConfig;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_SEED: &str = "data/seed.json";
const DEFAULT_EAV_STATIONS: &str = "data/eav_stations.json";

/// Error from reading the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub seed: PathBuf,
    pub reseed_interval: Option<Duration>,
    pub eav_base_url: Option<String>,
    pub eav_stations: PathBuf,
    pub eav_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_str = get("CIRCUM_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str.parse().map_err(|_| ConfigError {
            var: "CIRCUM_BIND",
            value: bind_str.clone(),
            reason: "expected host:port",
        })?;

        let reseed_interval = get("CIRCUM_RESEED_SECS")
            .map(|v| parse_secs("CIRCUM_RESEED_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let eav_timeout_secs = get("EAV_TIMEOUT_SECS")
            .map(|v| parse_secs("EAV_TIMEOUT_SECS", &v))
            .transpose()?;

        Ok(Self {
            bind,
            seed: get("CIRCUM_SEED").unwrap_or_else(|| DEFAULT_SEED.to_string()).into(),
            reseed_interval,
            eav_base_url: get("EAV_BASE_URL"),
            eav_stations: get("EAV_STATIONS")
                .unwrap_or_else(|| DEFAULT_EAV_STATIONS.to_string())
                .into(),
            eav_timeout_secs,
        })
    }

    /// Upstream client configuration, if a base URL is set.
    pub fn eav_config(&self) -> Option<EavConfig> {
        let base_url = self.eav_base_url.as_ref()?;
        let config = EavConfig::new(base_url.as_str());
        Some(match self.eav_timeout_secs {
            Some(secs) => config.with_timeout(secs),
            None => config,
        })
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "expected a positive number of seconds",
        }),
    }
}
