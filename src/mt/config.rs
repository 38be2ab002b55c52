use serde::{Deserialize, Serialize};
use url::Url;

use super::codec::DEFAULT_MAX_GET_PAYLOAD;
use super::error::{MtError, MtResult};
use super::transport::TransportKind;

/// Oldest relay script version that speaks the current wire format
pub const REQUIRED_RELAY_VERSION: u32 = 5;

fn default_relay_version() -> u32 {
    REQUIRED_RELAY_VERSION
}

fn default_enable_scrape() -> bool {
    true
}

fn default_scrape_url() -> String {
    "https://translate.google.com/m".to_string()
}

fn default_max_get_payload() -> usize {
    DEFAULT_MAX_GET_PAYLOAD
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    50
}

/// Settings of the translation relay and its transports
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Endpoint of the relay script (form POST and batched GET)
    pub relay_url: String,
    /// Shared secret expected by the relay, if any
    pub password: Option<String>,
    /// Version of the deployed relay script
    pub relay_version: u32,
    /// Try the public scrape endpoint before the relay
    pub enable_scrape: bool,
    pub scrape_url: String,
    /// Limit for the URL-encoded `list` value of one GET request
    pub max_get_payload: usize,
    pub timeout_secs: u64,
    /// Interval between scheduler ticks when the crate drives its own loop
    pub tick_interval_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_url: String::new(),
            password: None,
            relay_version: default_relay_version(),
            enable_scrape: default_enable_scrape(),
            scrape_url: default_scrape_url(),
            max_get_payload: default_max_get_payload(),
            timeout_secs: default_timeout_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("relay_url", &self.relay_url)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("relay_version", &self.relay_version)
            .field("enable_scrape", &self.enable_scrape)
            .field("scrape_url", &self.scrape_url)
            .field("max_get_payload", &self.max_get_payload)
            .field("timeout_secs", &self.timeout_secs)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> MtResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MtError::ConfigError(format!("{} has an invalid value '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> MtResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MtError::ConfigError(format!(
            "{} has an invalid value '{}'",
            key, value
        ))),
    }
}

impl RelayConfig {
    /// Create a configuration for a relay endpoint, other settings at their defaults
    pub fn new(relay_url: &str) -> Self {
        Self {
            relay_url: relay_url.to_string(),
            ..Self::default()
        }
    }

    /// Load settings from `LOCRELAY_*` environment variables
    ///
    /// Unset variables keep their defaults. The result is not validated.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // LOCRELAY_URL=https://script.google.com/macros/s/XXXX/exec
    /// let config = RelayConfig::from_env()?;
    /// config.validate()?;
    /// ```
    pub fn from_env() -> MtResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> MtResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("LOCRELAY_URL") {
            config.relay_url = url.trim().to_string();
        }
        if let Some(password) = lookup("LOCRELAY_PASSWORD") {
            config.password = Some(password).filter(|p| !p.is_empty());
        }
        if let Some(version) = lookup("LOCRELAY_VERSION") {
            config.relay_version = parse_var("LOCRELAY_VERSION", &version)?;
        }
        if let Some(scrape) = lookup("LOCRELAY_SCRAPE") {
            config.enable_scrape = parse_flag("LOCRELAY_SCRAPE", &scrape)?;
        }
        if let Some(url) = lookup("LOCRELAY_SCRAPE_URL") {
            config.scrape_url = url.trim().to_string();
        }
        if let Some(limit) = lookup("LOCRELAY_MAX_GET_PAYLOAD") {
            config.max_get_payload = parse_var("LOCRELAY_MAX_GET_PAYLOAD", &limit)?;
        }
        if let Some(timeout) = lookup("LOCRELAY_TIMEOUT_SECS") {
            config.timeout_secs = parse_var("LOCRELAY_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(tick) = lookup("LOCRELAY_TICK_MS") {
            config.tick_interval_ms = parse_var("LOCRELAY_TICK_MS", &tick)?;
        }

        Ok(config)
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> MtResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| MtError::ConfigError(format!("Invalid relay configuration: {}", e)))
    }

    /// Check the settings before any transport is started
    pub fn validate(&self) -> MtResult<()> {
        if self.relay_url.trim().is_empty() {
            return Err(MtError::ConfigError(
                "WebService is not set correctly: relay URL is empty".to_string(),
            ));
        }
        Url::parse(&self.relay_url).map_err(|e| {
            MtError::ConfigError(format!("Invalid relay URL '{}': {}", self.relay_url, e))
        })?;

        if self.relay_version < REQUIRED_RELAY_VERSION {
            return Err(MtError::ConfigError(format!(
                "Relay version {} is not supported, version {} or newer is required",
                self.relay_version, REQUIRED_RELAY_VERSION
            )));
        }

        if self.enable_scrape {
            Url::parse(&self.scrape_url).map_err(|e| {
                MtError::ConfigError(format!("Invalid scrape URL '{}': {}", self.scrape_url, e))
            })?;
        }

        if self.max_get_payload == 0 {
            return Err(MtError::ConfigError(
                "GET payload limit must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(MtError::ConfigError(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Transports to try, in order
    pub fn strategies(&self) -> Vec<TransportKind> {
        let mut strategies = Vec::with_capacity(3);
        if self.enable_scrape {
            strategies.push(TransportKind::Scrape);
        }
        strategies.push(TransportKind::Post);
        strategies.push(TransportKind::Get);
        strategies
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
