//! Diagnostic rule evaluation.
//!
//! Three dimensions are evaluated independently and then combined:
//! replica skew, deployment conditions, and (optionally) per-pod
//! health. First matching severity wins within a dimension.

use tracing::{info, warn};

use rudder_core::{
    ClusterGateway, ConditionStatus, DeploymentCondition, DeploymentRef, DeploymentSnapshot,
    OpsError, OpsResult, PodPhase, PodSnapshot, config::DEFAULT_RESTART_THRESHOLD,
};

use crate::report::{DiagnosticReport, PodReason, UnhealthyPod, Verdict};

/// Evaluates a deployment and its pods against the fixed rule set.
pub struct DiagnosticEngine<G> {
    gateway: G,
    restart_threshold: u32,
}

impl<G: ClusterGateway> DiagnosticEngine<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
        }
    }

    /// Override the crash-loop restart threshold (default 5).
    pub fn with_restart_threshold(mut self, restart_threshold: u32) -> Self {
        self.restart_threshold = restart_threshold;
        self
    }

    /// Produce a fresh health report for one deployment.
    ///
    /// Purely observational. Pod snapshots are only fetched when
    /// `include_pods` is set; if that fetch fails while the deployment
    /// read succeeded, the report is still returned with
    /// `pod_data_unavailable` set.
    pub async fn evaluate(
        &self,
        target: &DeploymentRef,
        include_pods: bool,
    ) -> OpsResult<DiagnosticReport> {
        if target.name.is_empty() {
            return Err(OpsError::Validation(
                "deployment name must not be empty".to_string(),
            ));
        }

        let snapshot = self.gateway.get_deployment(target).await?;

        let skew = skew_severity(&snapshot);
        let condition = condition_severity(&snapshot.conditions);

        let mut unhealthy_pods = Vec::new();
        let mut pod_severity = None;
        let mut pod_data_unavailable = false;
        let mut pods_total = 0u32;

        if include_pods {
            match self.gateway.list_pods(target).await {
                Ok(pods) => {
                    pods_total = pods.len() as u32;
                    for pod in &pods {
                        if let Some(reason) = self.classify_pod(pod) {
                            pod_severity = max_severity(pod_severity, Some(reason_severity(reason)));
                            unhealthy_pods.push(UnhealthyPod {
                                pod_name: pod.name.clone(),
                                reason,
                            });
                        }
                    }
                }
                Err(err) => {
                    // Partial data: degrade the report, don't abort it.
                    warn!(deployment = %target, error = %err, "pod snapshots unavailable");
                    pod_data_unavailable = true;
                }
            }
        }

        let overall_verdict = combine(skew, condition, pod_severity, &unhealthy_pods);
        let pods_unhealthy = unhealthy_pods.len() as u32;
        let report = DiagnosticReport {
            name: snapshot.name.clone(),
            namespace: snapshot.namespace.clone(),
            deployment_healthy: skew.is_none() && condition.is_none(),
            replica_skew: snapshot.replica_skew(),
            unhealthy_pods,
            overall_verdict,
            pod_data_unavailable,
            pods_total,
            pods_healthy: pods_total.saturating_sub(pods_unhealthy),
        };

        info!(
            deployment = %target,
            verdict = report.overall_verdict.label(),
            replica_skew = report.replica_skew,
            unhealthy_pods = report.unhealthy_pods.len(),
            partial = report.pod_data_unavailable,
            "diagnostic evaluated"
        );
        Ok(report)
    }

    /// First matching reason wins: phase, then restarts, then
    /// readiness.
    fn classify_pod(&self, pod: &PodSnapshot) -> Option<PodReason> {
        match pod.phase {
            PodPhase::Failed => return Some(PodReason::Failed),
            PodPhase::Unknown => return Some(PodReason::Unknown),
            _ => {}
        }

        let restarts = pod
            .containers
            .iter()
            .map(|c| c.restart_count)
            .max()
            .unwrap_or(0)
            .max(pod.restart_count);
        if restarts > self.restart_threshold {
            return Some(PodReason::CrashLoop);
        }

        if !pod.ready || pod.containers.iter().any(|c| !c.ready) {
            return Some(PodReason::NotReady);
        }

        None
    }
}

fn skew_severity(snapshot: &DeploymentSnapshot) -> Option<Verdict> {
    let skew = snapshot.replica_skew();
    if skew == 0 {
        None
    } else if skew < 0 {
        // More available than desired: the snapshot violates the
        // replica invariant. Treated as a data-integrity signal.
        Some(Verdict::Critical)
    } else if skew == i64::from(snapshot.desired_replicas) {
        // Nothing available at all.
        Some(Verdict::Critical)
    } else {
        Some(Verdict::Degraded)
    }
}

fn condition_severity(conditions: &[DeploymentCondition]) -> Option<Verdict> {
    for condition in conditions {
        if condition.kind == "Available" && condition.status == ConditionStatus::False {
            return Some(Verdict::Critical);
        }
        if condition.kind == "Progressing"
            && condition.status == ConditionStatus::False
            && is_failure_reason(condition.reason.as_deref())
        {
            return Some(Verdict::Critical);
        }
    }
    None
}

fn is_failure_reason(reason: Option<&str>) -> bool {
    matches!(reason, Some(r) if r == "ProgressDeadlineExceeded" || r.ends_with("Error"))
}

/// Severity a pod finding contributes to the overall verdict.
fn reason_severity(reason: PodReason) -> Verdict {
    match reason {
        // A dead or thrashing pod will not recover on its own.
        PodReason::Failed | PodReason::CrashLoop => Verdict::Critical,
        PodReason::NotReady | PodReason::Unknown => Verdict::Degraded,
    }
}

fn max_severity(a: Option<Verdict>, b: Option<Verdict>) -> Option<Verdict> {
    match (a, b) {
        (None, x) | (x, None) => x,
        (Some(x), Some(y)) => Some(x.max(y)),
    }
}

fn combine(
    skew: Option<Verdict>,
    condition: Option<Verdict>,
    pods: Option<Verdict>,
    unhealthy_pods: &[UnhealthyPod],
) -> Verdict {
    let worst = max_severity(max_severity(skew, condition), pods);
    match worst {
        Some(Verdict::Critical) => Verdict::Critical,
        Some(Verdict::Degraded) => Verdict::Degraded,
        _ if !unhealthy_pods.is_empty() => Verdict::Degraded,
        _ => Verdict::Healthy,
    }
}
