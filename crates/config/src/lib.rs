#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for the pokeshop entry server
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pokeshop/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use pokeshop_errors::{ConfigError, Error};
use pokeshop_types::{RenderEnvironment, EVENT_DEPENDENCY_HEADER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub fragments: FragmentConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Host server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

/// Front-end metadata sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64, // 0 = no periodic refresh
}

/// Fragment resolution and composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentConfig {
    #[serde(default)]
    pub environment: RenderEnvironment,
    #[serde(default = "default_dependency_header")]
    pub dependency_header: String,
    #[serde(default = "default_fragment_timeout_ms")]
    pub timeout_ms: u64, // 0 = no per-fragment deadline
    #[serde(default = "default_render_deadline_ms")]
    pub render_deadline_ms: u64, // 0 = wait for every fragment
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

// Default implementations

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            template_dir: default_template_dir(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            environment: RenderEnvironment::Server,
            dependency_header: default_dependency_header(),
            timeout_ms: default_fragment_timeout_ms(),
            render_deadline_ms: default_render_deadline_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

// Default value functions for serde
fn default_bind() -> String {
    "127.0.0.1:4200".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_sources() -> Vec<String> {
    vec!["http://localhost:3001/".to_string()]
}

fn default_refresh_interval_secs() -> u64 {
    2
}

fn default_dependency_header() -> String {
    EVENT_DEPENDENCY_HEADER.to_string()
}

fn default_fragment_timeout_ms() -> u64 {
    3000
}

fn default_render_deadline_ms() -> u64 {
    10_000
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn non_zero_millis(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_millis(value))
}

impl FragmentConfig {
    /// Per-fragment deadline, `None` when disabled
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_millis(self.timeout_ms)
    }

    /// Whole-page join deadline, `None` when disabled
    #[must_use]
    pub fn render_deadline(&self) -> Option<Duration> {
        non_zero_millis(self.render_deadline_ms)
    }
}

impl MetadataConfig {
    #[must_use]
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pokeshop").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Check values that serde cannot reject on its own
    ///
    /// # Errors
    ///
    /// Returns an error if a metadata source is blank or the dependency
    /// header name is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(source) = self.metadata.sources.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "metadata.sources".to_string(),
                value: source.clone(),
            }
            .into());
        }
        if self.fragments.dependency_header.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "fragments.dependency_header must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // POKESHOP_BIND
        if let Ok(bind) = std::env::var("POKESHOP_BIND") {
            self.server.bind = bind;
        }

        // POKESHOP_STATIC_DIR
        if let Ok(dir) = std::env::var("POKESHOP_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        // POKESHOP_TEMPLATE_DIR
        if let Ok(dir) = std::env::var("POKESHOP_TEMPLATE_DIR") {
            self.server.template_dir = PathBuf::from(dir);
        }

        // POKESHOP_METADATA_SOURCES
        if let Ok(sources) = std::env::var("POKESHOP_METADATA_SOURCES") {
            self.metadata.sources = sources
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        // POKESHOP_ENVIRONMENT
        if let Ok(environment) = std::env::var("POKESHOP_ENVIRONMENT") {
            self.fragments.environment =
                environment
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "POKESHOP_ENVIRONMENT".to_string(),
                        value: environment,
                    })?;
        }

        // POKESHOP_FRAGMENT_TIMEOUT_MS
        if let Ok(timeout) = std::env::var("POKESHOP_FRAGMENT_TIMEOUT_MS") {
            self.fragments.timeout_ms = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "POKESHOP_FRAGMENT_TIMEOUT_MS".to_string(),
                value: timeout,
            })?;
        }

        // POKESHOP_RENDER_DEADLINE_MS
        if let Ok(deadline) = std::env::var("POKESHOP_RENDER_DEADLINE_MS") {
            self.fragments.render_deadline_ms =
                deadline.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "POKESHOP_RENDER_DEADLINE_MS".to_string(),
                    value: deadline,
                })?;
        }

        self.validate()
    }
}
