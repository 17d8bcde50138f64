//! Configuration management for slotwatch
//!
//! Configuration comes from environment variables or a TOML file; command-line
//! flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::portal::headers::DEFAULT_USER_AGENT;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal addressing
    pub portal: PortalConfig,

    /// Account credentials
    pub credentials: Credentials,

    /// Poll loop configuration
    pub polling: PollingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Portal addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal host name
    pub host: String,

    /// Locale segment of every portal path (e.g. "pt-BR", "en-ca")
    pub locale: String,

    /// Visa case the appointments are booked under
    pub schedule_id: String,

    /// Consulate facility to watch
    pub facility_id: String,

    /// Full base address override, used against mock servers
    pub base_url: Option<String>,

    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Account credentials
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,

    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Fixed delay between polls and before every restart, in seconds
    pub refresh_delay_secs: u64,

    /// Decide but never submit a booking
    pub dry_run: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: String::from("ais.usvisa-info.com"),
            locale: String::from("pt-BR"),
            schedule_id: String::new(),
            facility_id: String::new(),
            base_url: None,
            user_agent: String::from(DEFAULT_USER_AGENT),
            request_timeout_secs: 30,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            refresh_delay_secs: 3,
            dry_run: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl PortalConfig {
    /// Base address all portal paths hang off
    ///
    /// ```
    /// use slotwatch::config::PortalConfig;
    ///
    /// let portal = PortalConfig::default();
    /// assert_eq!(portal.base_uri(), "https://ais.usvisa-info.com/pt-BR/niv");
    /// ```
    #[must_use]
    pub fn base_uri(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}/{}/niv", self.host, self.locale),
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let email = std::env::var("EMAIL").unwrap_or_default();
        let password = std::env::var("PASSWORD").unwrap_or_default();
        let schedule_id = std::env::var("SCHEDULE_ID").unwrap_or_default();
        let facility_id = std::env::var("FACILITY_ID").unwrap_or_default();

        let locale = std::env::var("LOCALE").unwrap_or(defaults.portal.locale);
        let host = std::env::var("PORTAL_HOST").unwrap_or(defaults.portal.host);
        let base_url = std::env::var("PORTAL_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let user_agent =
            std::env::var("SLOTWATCH_USER_AGENT").unwrap_or(defaults.portal.user_agent);

        let request_timeout_secs = match std::env::var("REQUEST_TIMEOUT") {
            Ok(v) => v
                .parse::<u64>()
                .with_context(|| format!("REQUEST_TIMEOUT must be a number of seconds, got {v:?}"))?,
            Err(_) => defaults.portal.request_timeout_secs,
        };

        let refresh_delay_secs = match std::env::var("REFRESH_DELAY") {
            Ok(v) => v
                .parse::<u64>()
                .with_context(|| format!("REFRESH_DELAY must be a number of seconds, got {v:?}"))?,
            Err(_) => defaults.polling.refresh_delay_secs,
        };

        let level = std::env::var("SLOTWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level);
        let format = std::env::var("SLOTWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            portal: PortalConfig {
                host,
                locale,
                schedule_id,
                facility_id,
                base_url,
                user_agent,
                request_timeout_secs,
            },
            credentials: Credentials { email, password },
            polling: PollingConfig {
                refresh_delay_secs,
                dry_run: false,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.credentials.email.trim().is_empty() {
            anyhow::bail!("email must be set (EMAIL)");
        }

        if self.credentials.password.is_empty() {
            anyhow::bail!("password must be set (PASSWORD)");
        }

        if self.portal.schedule_id.trim().is_empty() {
            anyhow::bail!("schedule_id must be set (SCHEDULE_ID)");
        }

        if self.portal.facility_id.trim().is_empty() {
            anyhow::bail!("facility_id must be set (FACILITY_ID)");
        }

        if self.portal.base_url.is_none()
            && (self.portal.host.trim().is_empty() || self.portal.locale.trim().is_empty())
        {
            anyhow::bail!("host and locale must be non-empty");
        }

        if self.polling.refresh_delay_secs == 0 {
            anyhow::bail!("refresh_delay_secs must be greater than 0");
        }

        if self.portal.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got {:?}", self.logging.format);
        }

        Ok(())
    }

    /// Get the poll delay as Duration
    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(self.polling.refresh_delay_secs)
    }
}
