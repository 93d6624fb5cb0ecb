//! Gateway configuration
//!
//! TOML sections covering:
//! - Logging level
//! - Performance profiles and connection capacity
//! - Session timing (monitor interval, expiry defaults, payload expiry)
//! - Queue and payload store bounds
//! - Subscription trie limits
//! - Predefined topic ids
//! - Environment variable overrides (VIBESN__* prefix)

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use config::{Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;

use crate::protocol::SESSION_EXPIRY_INFINITE;
use crate::topic::validation::{validate_topic_name, MAX_TOPIC_LENGTH};
use crate::tree::{
    TrieLimits, DEFAULT_MAX_MEMBERS_AT_LEVEL, DEFAULT_MAX_PATH_SEGMENTS, DEFAULT_MAX_PATH_SIZE,
};

#[cfg(test)]
mod tests;

/// Expand `${VAR}` and `${VAR:-default}` references; unset variables without a
/// default expand to nothing
fn substitute_env_vars(content: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}") else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    /// Malformed TOML passed to [`Config::parse`]
    Parse(toml::de::Error),
    /// Layered load or deserialization failure
    Config(config::ConfigError),
    /// Values that parse but cannot work together
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Config(e) => write!(f, "Config error: {}", e),
            ConfigError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Config(e)
    }
}

/// Gateway configuration, every section optional
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    /// Gateway capacity and behaviour
    pub gateway: GatewayConfig,
    /// Session timing
    pub session: SessionConfig,
    /// Queue and payload store bounds
    pub queue: QueueConfig,
    /// Subscription trie limits
    pub tree: TreeConfig,
    /// Predefined topics
    pub topics: TopicsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Preset capacity figures for common deployment models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceProfile {
    /// On-site gateway, limits resource use
    #[default]
    BalancedGateway,
    /// Cloud deployment balanced between ingress and egress
    BalancedCloud,
    /// Cloud deployment dominated by device traffic
    IngressCloud,
    /// Cloud deployment dominated by traffic to devices
    EgressCloud,
}

impl PerformanceProfile {
    pub fn max_connected_clients(&self) -> usize {
        match self {
            PerformanceProfile::BalancedGateway => 100,
            PerformanceProfile::BalancedCloud => 5000,
            PerformanceProfile::IngressCloud => 10_000,
            PerformanceProfile::EgressCloud => 5000,
        }
    }

    pub fn max_queue_size(&self) -> usize {
        match self {
            PerformanceProfile::BalancedGateway => 25,
            PerformanceProfile::BalancedCloud => 50,
            PerformanceProfile::IngressCloud => 25,
            PerformanceProfile::EgressCloud => 250,
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Performance profile supplying capacity defaults
    pub profile: PerformanceProfile,
    /// Maximum live sessions (overrides the profile)
    pub max_connected_clients: Option<usize>,
    /// Whether going to sleep drops the session's topic registrations
    pub sleep_clears_registrations: bool,
    /// Maximum topic length in bytes
    #[serde(default = "default_max_topic_length")]
    pub max_topic_length: usize,
}

fn default_max_topic_length() -> usize {
    MAX_TOPIC_LENGTH
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            profile: PerformanceProfile::default(),
            max_connected_clients: None,
            sleep_clears_registrations: false,
            max_topic_length: default_max_topic_length(),
        }
    }
}

impl GatewayConfig {
    /// Effective capacity: explicit value or the profile's
    pub fn max_connected_clients(&self) -> usize {
        self.max_connected_clients
            .unwrap_or_else(|| self.profile.max_connected_clients())
    }
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between session sweeps (e.g., "30s")
    #[serde(default = "default_monitor_interval", with = "humantime_serde")]
    pub monitor_interval: Duration,
    /// Session expiry in seconds applied when CONNECT carries none
    /// (4294967295 = never expires)
    #[serde(default = "default_session_expiry")]
    pub default_session_expiry: u32,
    /// Maximum packet size applied when CONNECT carries none
    #[serde(default = "default_max_packet_size")]
    pub default_max_packet_size: u32,
    /// Lifetime of payloads shared between several sessions (e.g., "365d")
    #[serde(default = "default_payload_expiry", with = "humantime_serde")]
    pub payload_expiry: Duration,
    /// Maximum results returned by a client id prefix search
    #[serde(default = "default_prefix_search_limit")]
    pub prefix_search_limit: usize,
}

fn default_monitor_interval() -> Duration {
    Duration::from_secs(30)
}
fn default_session_expiry() -> u32 {
    SESSION_EXPIRY_INFINITE
}
fn default_max_packet_size() -> u32 {
    65535
}
fn default_payload_expiry() -> Duration {
    Duration::from_secs(365 * 24 * 60 * 60)
}
fn default_prefix_search_limit() -> usize {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            monitor_interval: default_monitor_interval(),
            default_session_expiry: default_session_expiry(),
            default_max_packet_size: default_max_packet_size(),
            payload_expiry: default_payload_expiry(),
            prefix_search_limit: default_prefix_search_limit(),
        }
    }
}

/// Queue configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued messages per session (overrides the profile)
    pub max_queue_size: Option<usize>,
    /// Maximum payloads held in the shared payload store
    #[serde(default = "default_max_stored_payloads")]
    pub max_stored_payloads: usize,
}

fn default_max_stored_payloads() -> usize {
    100_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: None,
            max_stored_payloads: default_max_stored_payloads(),
        }
    }
}

/// Subscription trie limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    #[serde(default = "default_max_path_segments")]
    pub max_path_segments: usize,
    #[serde(default = "default_max_path_size")]
    pub max_path_size: usize,
    #[serde(default = "default_max_members_at_level")]
    pub max_members_at_level: usize,
}

fn default_max_path_segments() -> usize {
    DEFAULT_MAX_PATH_SEGMENTS
}
fn default_max_path_size() -> usize {
    DEFAULT_MAX_PATH_SIZE
}
fn default_max_members_at_level() -> usize {
    DEFAULT_MAX_MEMBERS_AT_LEVEL
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_path_segments: default_max_path_segments(),
            max_path_size: default_max_path_size(),
            max_members_at_level: default_max_members_at_level(),
        }
    }
}

impl TreeConfig {
    pub fn limits(&self) -> TrieLimits {
        TrieLimits {
            max_path_segments: self.max_path_segments,
            max_path_size: self.max_path_size,
            max_members_at_level: self.max_members_at_level,
        }
    }
}

/// Predefined topic configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TopicsConfig {
    pub predefined: Vec<PredefinedTopic>,
}

/// A topic id agreed with devices out of band
#[derive(Debug, Clone, Deserialize)]
pub struct PredefinedTopic {
    pub id: u16,
    pub topic: String,
}

impl Config {
    /// Load a TOML file layered over built-in defaults, then apply environment
    /// overrides
    ///
    /// Environment variables enter in two ways:
    /// 1. `${VAR}` / `${VAR:-default}` references inside the file are expanded
    /// 2. `VIBESN__SECTION__KEY` variables override individual keys, e.g.
    ///    - `VIBESN__GATEWAY__PROFILE=egress-cloud` overrides `gateway.profile`
    ///    - `VIBESN__SESSION__MONITOR_INTERVAL=10s` overrides `session.monitor_interval`
    ///    - `VIBESN__QUEUE__MAX_QUEUE_SIZE=500` overrides `queue.max_queue_size`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("log.level", "info")?
            .set_default("gateway.profile", "balanced-gateway")?
            .set_default("gateway.sleep_clears_registrations", false)?
            .set_default("gateway.max_topic_length", MAX_TOPIC_LENGTH as u64)?
            .set_default("session.monitor_interval", "30s")?
            .set_default("session.default_session_expiry", SESSION_EXPIRY_INFINITE as u64)?
            .set_default("session.default_max_packet_size", 65535)?
            .set_default("session.payload_expiry", "365d")?
            .set_default("session.prefix_search_limit", 100)?
            .set_default("queue.max_stored_payloads", 100_000)?
            .set_default("tree.max_path_segments", DEFAULT_MAX_PATH_SEGMENTS as u64)?
            .set_default("tree.max_path_size", DEFAULT_MAX_PATH_SIZE as u64)?
            .set_default("tree.max_members_at_level", DEFAULT_MAX_MEMBERS_AT_LEVEL as u64)?;

        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let substituted = substitute_env_vars(&content);
                builder = builder.add_source(File::from_str(&substituted, FileFormat::Toml));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Missing file means defaults only
            }
            Err(e) => return Err(ConfigError::Io(e)),
        }

        // `__` separates sections so keys keep their single underscores
        let cfg = builder
            .add_source(
                Environment::with_prefix("VIBESN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, without a file
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Path::new(""))
    }

    /// Parse a TOML string; no substitution or environment overrides
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective per-session queue bound: explicit value or the profile's
    pub fn max_queue_size(&self) -> usize {
        self.queue
            .max_queue_size
            .unwrap_or_else(|| self.gateway.profile.max_queue_size())
    }

    /// Reject combinations that would fail at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.monitor_interval.is_zero() {
            return Err(ConfigError::Validation(
                "session.monitor_interval must be greater than zero".to_string(),
            ));
        }

        if self.gateway.max_topic_length == 0 {
            return Err(ConfigError::Validation(
                "gateway.max_topic_length must be greater than zero".to_string(),
            ));
        }

        // Anything longer could never be stored in the trie
        if self.gateway.max_topic_length > self.tree.max_path_size {
            return Err(ConfigError::Validation(format!(
                "gateway.max_topic_length ({}) exceeds tree.max_path_size ({})",
                self.gateway.max_topic_length, self.tree.max_path_size
            )));
        }

        if self.queue.max_stored_payloads == 0 {
            return Err(ConfigError::Validation(
                "queue.max_stored_payloads must be greater than zero".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for predefined in &self.topics.predefined {
            if predefined.id == 0 {
                return Err(ConfigError::Validation(format!(
                    "Predefined topic '{}' uses reserved id 0",
                    predefined.topic
                )));
            }
            if !ids.insert(predefined.id) {
                return Err(ConfigError::Validation(format!(
                    "Predefined topic id {} is declared more than once",
                    predefined.id
                )));
            }
            if let Err(e) = validate_topic_name(&predefined.topic, self.gateway.max_topic_length) {
                return Err(ConfigError::Validation(format!(
                    "Predefined topic '{}' is invalid: {}",
                    predefined.topic, e
                )));
            }
        }

        Ok(())
    }
}
