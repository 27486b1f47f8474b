//! Gateway connection settings.
//!
//! Values are read from the environment (`CPANEL_HOST`, `CPANEL_USERNAME`,
//! `CPANEL_API_TOKEN`, `CPANEL_TIMEOUT_SECS`) and then overridden by the
//! `[gateway]` table of a TOML file when one is given.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Connection settings for one control-panel account.
///
/// Constructed once at startup and passed by reference to every reconciler.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the control panel, e.g. `https://host.example.com:2083`.
    #[serde(default)]
    pub host: String,
    /// Account user name.
    #[serde(default)]
    pub username: String,
    /// API token for the account.
    #[serde(default)]
    pub api_token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("api_token", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GatewayConfig {
    /// Creates a configuration from explicit values.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Host without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// Checks that every value needed to build a client is present and usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "username",
                env: "CPANEL_USERNAME",
            });
        }
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "api_token",
                env: "CPANEL_API_TOKEN",
            });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "host",
                env: "CPANEL_HOST",
            });
        }
        let url = Url::parse(self.base_url())
            .map_err(|e| ConfigError::invalid("host", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "host",
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be > 0"));
        }
        Ok(())
    }

    /// Token with all but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.api_token.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{tail}", "*".repeat(chars.len() - 4))
    }
}

pub mod loader {
    use super::GatewayConfig;
    use crate::error::ConfigError;
    use config::{Config, Environment, File, FileFormat};
    use std::path::Path;

    const KEYS: [&str; 4] = ["host", "username", "api_token", "timeout_secs"];

    /// Loads gateway settings from the environment, overridden by `[gateway]` in `path`.
    ///
    /// A missing file is not an error; the environment alone may be enough.
    pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
        // CPANEL_API_TOKEN -> api_token
        // Values stay strings; timeout_secs is parsed during deserialization.
        let mut builder = Config::builder()
            .add_source(Environment::with_prefix("CPANEL").prefix_separator("_"));
        if let Some(p) = path
            && p.exists()
        {
            let file = Config::builder()
                .add_source(File::from(p).format(FileFormat::Toml))
                .build()?;
            for key in KEYS {
                if let Ok(value) = file.get::<config::Value>(&format!("gateway.{key}")) {
                    builder = builder.set_override(key, value)?;
                }
            }
        }
        let merged: GatewayConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        tracing::debug!(host = %merged.host, username = %merged.username, "gateway configuration loaded");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_first_missing_value() {
        let cfg = GatewayConfig::new("https://host:2083", "", "token");
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Missing { field: "username", .. })
        ));

        let cfg = GatewayConfig::new("", "user", "token");
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Missing { field: "host", .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_host_and_timeout() {
        let cfg = GatewayConfig::new("ftp://host", "user", "token");
        assert!(cfg.validate().is_err());

        let cfg = GatewayConfig::new("https://host:2083/", "user", "token").with_timeout_secs(0);
        assert!(cfg.validate().is_err());

        let cfg = GatewayConfig::new("https://host:2083/", "user", "token");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.base_url(), "https://host:2083");
    }

    #[test]
    fn debug_never_prints_token() {
        let cfg = GatewayConfig::new("https://host", "user", "s3cr3t-token");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert_eq!(cfg.masked_token(), "********oken");
    }
}
