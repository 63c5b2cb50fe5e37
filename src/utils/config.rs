//! Configuration management for addrscout.
//!
//! This module provides TOML-based configuration with support for multiple
//! configuration sources (default, file-based, environment variables) and
//! validation of configuration parameters.

use crate::utils::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "addrscout.toml";

/// Environment variable prefix for configuration
pub const ENV_PREFIX: &str = "ADDRSCOUT";

/// Complete configuration for address discovery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Discovery engine configuration
    pub discovery: DiscoveryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Startup resource limits
    pub limits: LimitsConfig,
}

/// Discovery engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Target probed when the caller does not name one. A literal address
    /// keeps node startup independent of DNS.
    pub default_target: String,
    /// Remote port used for the outbound probe; nothing is sent to it
    pub probe_port: u16,
    /// Locale forced on the network-configuration tool
    pub locale: String,
    /// Extra targets probed on platforms where tool scraping is replaced by
    /// repeated probing
    pub loopback_fallbacks: Vec<String>,
    /// Upper bound the command line applies to a whole discovery, in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

/// Descriptor limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Raise the soft open-file limit at startup
    pub raise_nofile: bool,
    /// Soft limit considered good enough to leave alone
    pub min_nofile: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_target: crate::defaults::DEFAULT_TARGET.to_string(),
            probe_port: crate::defaults::DEFAULT_PROBE_PORT,
            locale: crate::defaults::DEFAULT_LOCALE.to_string(),
            loopback_fallbacks: crate::defaults::LOOPBACK_FALLBACKS
                .iter()
                .map(|target| target.to_string())
                .collect(),
            timeout_secs: crate::defaults::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            raise_nofile: true,
            min_nofile: crate::defaults::DEFAULT_MIN_NOFILE,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or fails validation
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with multiple sources (default, file, environment)
    ///
    /// An explicit `config_file` that does not exist is ignored, matching
    /// the behaviour for the default locations.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let file_config = Self::from_file(path)?;
                config = config.merge(file_config);
            }
        } else {
            for location in Self::default_locations() {
                if location.exists() {
                    let file_config = Self::from_file(&location)?;
                    config = config.merge(file_config);
                    break;
                }
            }
        }

        config = config.merge_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Places searched for a configuration file when none is given
    pub fn default_locations() -> Vec<PathBuf> {
        vec![
            PathBuf::from(DEFAULT_CONFIG_FILE),
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("addrscout")
                .join(DEFAULT_CONFIG_FILE),
        ]
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Merge this configuration with another, preferring values from other
    pub fn merge(mut self, other: Self) -> Self {
        self.discovery = other.discovery;
        self.logging = other.logging;
        self.limits = other.limits;
        self
    }

    /// Merge configuration from environment variables
    fn merge_from_env(mut self) -> Result<Self> {
        if let Ok(target) = std::env::var(format!("{ENV_PREFIX}_DISCOVERY_DEFAULT_TARGET")) {
            self.discovery.default_target = target;
        }

        let port_var = format!("{ENV_PREFIX}_DISCOVERY_PROBE_PORT");
        if let Ok(port) = std::env::var(&port_var) {
            self.discovery.probe_port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: port_var,
                    value: port,
                })?;
        }

        if let Ok(level) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<()> {
        if self.discovery.default_target.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "discovery.default_target".to_string(),
            }
            .into());
        }

        if self.discovery.probe_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.probe_port".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.discovery.locale.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "discovery.locale".to_string(),
            }
            .into());
        }

        if self.discovery.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "logging.level".to_string(),
                    value: self.logging.level.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Get the configuration as a pretty-printed TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::ParseError {
                reason: e.to_string(),
            }
            .into()
        })
    }
}
