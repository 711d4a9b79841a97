//! Snapshot data model for deployments and pods.
//!
//! All types here are immutable point-in-time views: a fresh snapshot is
//! fetched on every poll and never mutated after construction. They are
//! serializable so reports and results can be rendered as JSON.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── References ─────────────────────────────────────────────────────

/// Unique identifier for a deployment. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentRef {
    pub name: String,
    pub namespace: String,
}

impl DeploymentRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for DeploymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ── Deployment ─────────────────────────────────────────────────────

/// Point-in-time view of a deployment's spec and observed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSnapshot {
    pub name: String,
    pub namespace: String,
    pub desired_replicas: u32,
    pub updated_replicas: u32,
    pub available_replicas: u32,
    pub ready_replicas: u32,
    /// Desired-state revision counter from the deployment's metadata.
    pub generation: i64,
    /// Revision the cluster controller has acknowledged.
    pub observed_generation: i64,
    pub conditions: Vec<DeploymentCondition>,
    pub labels: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl DeploymentSnapshot {
    /// Signed difference between desired and available replicas.
    ///
    /// Negative skew means the cluster reports more available than
    /// desired — a data-integrity signal, surfaced rather than clamped.
    pub fn replica_skew(&self) -> i64 {
        i64::from(self.desired_replicas) - i64::from(self.available_replicas)
    }

    pub fn deployment_ref(&self) -> DeploymentRef {
        DeploymentRef::new(&self.name, &self.namespace)
    }
}

/// One entry of a deployment's condition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentCondition {
    /// Condition type, e.g. "Available" or "Progressing".
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Tri-state condition status as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Parse the wire representation ("True"/"False"/anything else).
    pub fn parse(s: &str) -> Self {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

/// Listing row for `rudder list` — identity plus replica counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub desired_replicas: u32,
    pub available_replicas: u32,
}

// ── Pod ────────────────────────────────────────────────────────────

/// Point-in-time view of one pod owned by a deployment.
///
/// The deployment→pod relation is recomputed from the label selector on
/// every poll; there is no persistent ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub name: String,
    pub phase: PodPhase,
    /// True when every container in the pod reports ready.
    pub ready: bool,
    /// Highest restart count across the pod's containers.
    pub restart_count: u32,
    pub containers: Vec<ContainerStatus>,
}

/// Pod lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Parse the wire representation; anything unrecognized is Unknown.
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Per-container status within a pod snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: u32,
    /// Reason from the container's last termination, if any
    /// (e.g. "OOMKilled", "Error").
    pub last_termination_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(desired: u32, available: u32) -> DeploymentSnapshot {
        DeploymentSnapshot {
            name: "api".to_string(),
            namespace: "default".to_string(),
            desired_replicas: desired,
            updated_replicas: available,
            available_replicas: available,
            ready_replicas: available,
            generation: 1,
            observed_generation: 1,
            conditions: Vec::new(),
            labels: HashMap::new(),
            created_at: None,
        }
    }

    #[test]
    fn deployment_ref_display() {
        let target = DeploymentRef::new("api", "prod");
        assert_eq!(target.to_string(), "prod/api");
    }

    #[test]
    fn replica_skew_is_signed() {
        assert_eq!(snapshot(3, 1).replica_skew(), 2);
        assert_eq!(snapshot(3, 3).replica_skew(), 0);
        // More available than desired is negative, never clamped.
        assert_eq!(snapshot(1, 3).replica_skew(), -2);
    }

    #[test]
    fn condition_status_parse() {
        assert_eq!(ConditionStatus::parse("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::parse("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::parse("bogus"), ConditionStatus::Unknown);
    }

    #[test]
    fn pod_phase_parse() {
        assert_eq!(PodPhase::parse("Running"), PodPhase::Running);
        assert_eq!(PodPhase::parse("Failed"), PodPhase::Failed);
        assert_eq!(PodPhase::parse(""), PodPhase::Unknown);
    }
}
