use rudder_core::{ClusterGateway, OpsError, OpsResult, resolve_deployment};
use rudder_diagnostic::{DiagnosticEngine, DiagnosticReport, PodReason};

pub async fn run<G: ClusterGateway>(
    gateway: G,
    name: &str,
    namespace: Option<&str>,
    include_pods: bool,
    format: &str,
    restart_threshold: u32,
) -> OpsResult<u8> {
    let target = resolve_deployment(&gateway, name, namespace).await?;
    let engine = DiagnosticEngine::new(gateway).with_restart_threshold(restart_threshold);
    let report = engine.evaluate(&target, include_pods).await?;

    match format {
        "json" => {
            let body = serde_json::to_string_pretty(&report)
                .map_err(|e| OpsError::Validation(format!("cannot encode report: {e}")))?;
            println!("{body}");
        }
        _ => println!("{}", render(&report)),
    }
    // The verdict is the report's content, not the process outcome.
    Ok(0)
}

fn render(report: &DiagnosticReport) -> String {
    let mut out = format!("Deployment:  {}/{}", report.namespace, report.name);
    out.push_str(&format!("\nVerdict:     {}", report.overall_verdict.label()));
    out.push_str(&format!("\nSkew:        {}", skew_label(report.replica_skew)));
    out.push_str(&format!(
        "\nChecks:      {}",
        if report.deployment_healthy { "ok" } else { "failing" }
    ));

    if report.pod_data_unavailable {
        out.push_str("\nPods:        unavailable (could not fetch pod snapshots)");
    } else if report.pods_total > 0 || !report.unhealthy_pods.is_empty() {
        out.push_str(&format!(
            "\nPods:        {}/{} healthy",
            report.pods_healthy, report.pods_total
        ));
        for pod in &report.unhealthy_pods {
            out.push_str(&format!("\n  {}: {}", pod.pod_name, reason_label(pod.reason)));
        }
    }
    out
}

fn skew_label(skew: i64) -> String {
    match skew {
        0 => "balanced".to_string(),
        s if s > 0 => format!("{s} replica(s) short of desired"),
        s => format!("{} replica(s) over desired", -s),
    }
}

fn reason_label(reason: PodReason) -> &'static str {
    match reason {
        PodReason::CrashLoop => "crash loop",
        PodReason::NotReady => "not ready",
        PodReason::Failed => "failed",
        PodReason::Unknown => "unknown state",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::{FakeGateway, snapshot};
    use rudder_diagnostic::{UnhealthyPod, Verdict};

    fn report(verdict: Verdict, skew: i64) -> DiagnosticReport {
        DiagnosticReport {
            name: "api".to_string(),
            namespace: "prod".to_string(),
            deployment_healthy: skew == 0,
            replica_skew: skew,
            unhealthy_pods: Vec::new(),
            overall_verdict: verdict,
            pod_data_unavailable: false,
            pods_total: 3,
            pods_healthy: 3,
        }
    }

    #[tokio::test]
    async fn evaluates_resolved_deployment() {
        let gateway = FakeGateway::with_deployments(vec![snapshot("api", "prod", 3, 3)]);
        let code = run(&gateway, "api", Some("prod"), false, "text", 5)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn unhealthy_verdict_still_exits_zero() {
        let gateway = FakeGateway::with_deployments(vec![snapshot("api", "prod", 3, 1)]);
        let code = run(&gateway, "api", Some("prod"), true, "text", 5)
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn render_healthy_report() {
        let out = render(&report(Verdict::Healthy, 0));
        assert!(out.contains("Verdict:     HEALTHY"));
        assert!(out.contains("Skew:        balanced"));
        assert!(out.contains("Pods:        3/3 healthy"));
    }

    #[test]
    fn render_lists_unhealthy_pods() {
        let mut r = report(Verdict::Critical, 2);
        r.pods_healthy = 1;
        r.unhealthy_pods = vec![
            UnhealthyPod {
                pod_name: "api-1".to_string(),
                reason: PodReason::CrashLoop,
            },
            UnhealthyPod {
                pod_name: "api-2".to_string(),
                reason: PodReason::NotReady,
            },
        ];
        let out = render(&r);
        assert!(out.contains("2 replica(s) short of desired"));
        assert!(out.contains("api-1: crash loop"));
        assert!(out.contains("api-2: not ready"));
    }

    #[test]
    fn render_flags_missing_pod_data() {
        let mut r = report(Verdict::Healthy, 0);
        r.pod_data_unavailable = true;
        assert!(render(&r).contains("Pods:        unavailable"));
    }
}
