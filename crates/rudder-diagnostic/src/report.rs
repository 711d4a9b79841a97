//! Diagnostic report types.

use serde::{Deserialize, Serialize};

/// Overall health verdict for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Healthy,
    Degraded,
    Critical,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Healthy => "HEALTHY",
            Verdict::Degraded => "DEGRADED",
            Verdict::Critical => "CRITICAL",
        }
    }
}

/// Why a pod was flagged as unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodReason {
    /// Restart count above the configured threshold.
    CrashLoop,
    /// A container has not reported ready.
    NotReady,
    /// Pod phase is Failed.
    Failed,
    /// Pod phase is Unknown.
    Unknown,
}

/// One flagged pod, in cluster listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhealthyPod {
    pub pod_name: String,
    pub reason: PodReason,
}

/// Structured health report for one deployment.
///
/// Produced fresh per invocation and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub name: String,
    pub namespace: String,
    /// Deployment-level dimensions (replica skew, conditions) are all
    /// clean. Pod findings do not affect this flag.
    pub deployment_healthy: bool,
    /// `desired - available`; negative values are surfaced, not
    /// clamped.
    pub replica_skew: i64,
    pub unhealthy_pods: Vec<UnhealthyPod>,
    pub overall_verdict: Verdict,
    /// Pod snapshots could not be fetched; the report is still valid
    /// but pod-level detail is missing.
    pub pod_data_unavailable: bool,
    pub pods_total: u32,
    pub pods_healthy: u32,
}
