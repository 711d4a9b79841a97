use rudder_core::{
    ClusterGateway, ConditionStatus, DeploymentSnapshot, OpsResult, PodSnapshot,
    resolve_deployment,
};

pub async fn run<G: ClusterGateway>(
    gateway: G,
    name: &str,
    namespace: Option<&str>,
) -> OpsResult<u8> {
    let target = resolve_deployment(&gateway, name, namespace).await?;
    let snapshot = gateway.get_deployment(&target).await?;
    let pods = gateway.list_pods(&target).await?;
    println!("{}", render(&snapshot, &pods));
    Ok(0)
}

fn render(snapshot: &DeploymentSnapshot, pods: &[PodSnapshot]) -> String {
    let mut out = format!("Deployment:  {}/{}", snapshot.namespace, snapshot.name);
    out.push_str(&format!(
        "\nReplicas:    {} desired, {} updated, {} available, {} ready",
        snapshot.desired_replicas,
        snapshot.updated_replicas,
        snapshot.available_replicas,
        snapshot.ready_replicas
    ));
    out.push_str(&format!(
        "\nGeneration:  {} (observed {})",
        snapshot.generation, snapshot.observed_generation
    ));
    if let Some(created) = snapshot.created_at {
        out.push_str(&format!("\nCreated:     {}", created.to_rfc3339()));
    }

    if !snapshot.labels.is_empty() {
        let mut labels: Vec<String> = snapshot
            .labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        labels.sort();
        out.push_str(&format!("\nLabels:      {}", labels.join(", ")));
    }

    if !snapshot.conditions.is_empty() {
        out.push_str("\nConditions:");
        for condition in &snapshot.conditions {
            out.push_str(&format!(
                "\n  {}={}",
                condition.kind,
                status_label(condition.status)
            ));
            if let Some(reason) = &condition.reason {
                out.push_str(&format!(" ({reason})"));
            }
        }
    }

    if pods.is_empty() {
        out.push_str("\nPods:        none");
    } else {
        out.push_str("\nPods:");
        for pod in pods {
            out.push_str(&format!(
                "\n  {}  {}  ready={}  restarts={}",
                pod.name, pod.phase, pod.ready, pod.restart_count
            ));
        }
    }
    out
}

fn status_label(status: ConditionStatus) -> &'static str {
    match status {
        ConditionStatus::True => "True",
        ConditionStatus::False => "False",
        ConditionStatus::Unknown => "Unknown",
    }
}
