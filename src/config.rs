// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Every section deserializes with defaults, so a partial document (or none)
//! is valid. [`HelpdeskConfig::from_env`] overlays environment variables on
//! the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{HelpdeskError, HelpdeskResult};
use crate::nats::NatsConfig;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub nats: NatsConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub catch_up: CatchUpConfig,

    /// Partitions, each with its own projection daemon and storage
    #[serde(default = "default_databases")]
    pub databases: Vec<String>,
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig::default(),
            daemon: DaemonConfig::default(),
            catch_up: CatchUpConfig::default(),
            databases: default_databases(),
        }
    }
}

/// Projection daemon (shard worker) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Maximum number of events per committed batch
    /// Default: 500
    #[serde(default = "default_batch_events_max")]
    pub batch_events_max: usize,

    /// Poll interval when caught up (milliseconds)
    /// Default: 50ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after a failed batch (milliseconds)
    /// Default: 1000ms
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl DaemonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            batch_events_max: default_batch_events_max(),
            poll_interval_ms: default_poll_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

/// Bounds for waiting on a projection to catch up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchUpConfig {
    /// Maximum number of wait attempts
    /// Default: 20
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Upper bound of each wait inside one attempt (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl CatchUpConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for CatchUpConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

fn default_databases() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_batch_events_max() -> usize {
    500
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_error_backoff_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    20
}

fn default_attempt_timeout_ms() -> u64 {
    5000
}

impl HelpdeskConfig {
    /// Load configuration from environment variables
    ///
    /// - `HELPDESK_NATS_URL`: comma-separated server list
    /// - `HELPDESK_DATABASES`: comma-separated database ids
    /// - `HELPDESK_BATCH_EVENTS_MAX`
    /// - `HELPDESK_POLL_INTERVAL_MS`
    /// - `HELPDESK_CATCH_UP_MAX_ATTEMPTS`
    /// - `HELPDESK_CATCH_UP_ATTEMPT_TIMEOUT_MS`
    pub fn from_env() -> HelpdeskResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> HelpdeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(urls) = lookup("HELPDESK_NATS_URL") {
            config.nats.servers = split_list(&urls);
        }
        if let Some(databases) = lookup("HELPDESK_DATABASES") {
            config.databases = split_list(&databases);
        }
        if let Some(value) = lookup("HELPDESK_BATCH_EVENTS_MAX") {
            config.daemon.batch_events_max = parse_number("HELPDESK_BATCH_EVENTS_MAX", &value)?;
        }
        if let Some(value) = lookup("HELPDESK_POLL_INTERVAL_MS") {
            config.daemon.poll_interval_ms = parse_number("HELPDESK_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("HELPDESK_CATCH_UP_MAX_ATTEMPTS") {
            config.catch_up.max_attempts =
                parse_number("HELPDESK_CATCH_UP_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("HELPDESK_CATCH_UP_ATTEMPT_TIMEOUT_MS") {
            config.catch_up.attempt_timeout_ms =
                parse_number("HELPDESK_CATCH_UP_ATTEMPT_TIMEOUT_MS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the daemon and coordinator cannot run with
    pub fn validate(&self) -> HelpdeskResult<()> {
        if self.nats.servers.is_empty() {
            return Err(HelpdeskError::Configuration(
                "at least one NATS server is required".to_string(),
            ));
        }
        if self.databases.is_empty() {
            return Err(HelpdeskError::Configuration(
                "at least one database is required".to_string(),
            ));
        }
        if self.daemon.batch_events_max == 0 {
            return Err(HelpdeskError::Configuration(
                "batch_events_max must be positive".to_string(),
            ));
        }
        if self.catch_up.max_attempts == 0 || self.catch_up.attempt_timeout_ms == 0 {
            return Err(HelpdeskError::Configuration(
                "catch-up attempts and attempt timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> HelpdeskResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HelpdeskError::Configuration(format!("{key} is not a valid number: {value}")))
}
