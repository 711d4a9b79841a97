//! rudder.toml configuration parser.
//!
//! Every field is optional; accessors fall back to built-in defaults so
//! the tool runs with no config file at all.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default rollout monitoring window.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Default cadence between rollout polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Consecutive fetch failures tolerated inside the polling loop.
pub const DEFAULT_FETCH_RETRY_LIMIT: u32 = 3;
/// Restart count above which a pod is flagged as crash-looping.
pub const DEFAULT_RESTART_THRESHOLD: u32 = 5;
/// Default number of trailing log lines fetched per pod.
pub const DEFAULT_LOG_TAIL: u32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RudderConfig {
    pub cluster: Option<ClusterConfig>,
    pub rollout: Option<RolloutConfig>,
    pub diagnostic: Option<DiagnosticConfig>,
}

/// Where to reach the cluster API. Authentication itself is out of
/// scope: the endpoint is assumed to be already authenticated (e.g. a
/// local `kubectl proxy`), optionally with a static bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub api_url: Option<String>,
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolloutConfig {
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub fetch_retry_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticConfig {
    pub restart_threshold: Option<u32>,
}

impl RudderConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RudderConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn api_url(&self) -> Option<&str> {
        self.cluster.as_ref()?.api_url.as_deref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.cluster.as_ref()?.bearer_token.as_deref()
    }

    pub fn rollout_timeout(&self) -> Duration {
        let secs = self
            .rollout
            .as_ref()
            .and_then(|r| r.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .rollout
            .as_ref()
            .and_then(|r| r.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn fetch_retry_limit(&self) -> u32 {
        self.rollout
            .as_ref()
            .and_then(|r| r.fetch_retry_limit)
            .unwrap_or(DEFAULT_FETCH_RETRY_LIMIT)
    }

    pub fn restart_threshold(&self) -> u32 {
        self.diagnostic
            .as_ref()
            .and_then(|d| d.restart_threshold)
            .unwrap_or(DEFAULT_RESTART_THRESHOLD)
    }
}
