use tracing::info;

use rudder_core::{ClusterGateway, DeploymentRef, OpsResult, resolve_deployment};

pub async fn run<G: ClusterGateway>(
    gateway: G,
    name: &str,
    namespace: Option<&str>,
    replicas: u32,
) -> OpsResult<u8> {
    let target = resolve_deployment(&gateway, name, namespace).await?;
    let before = gateway.get_deployment(&target).await?;

    gateway.scale(&target, replicas).await?;
    info!(
        deployment = %target,
        from = before.desired_replicas,
        to = replicas,
        "scale applied"
    );

    println!("{}", render(&target, before.desired_replicas, replicas));
    Ok(0)
}

fn render(target: &DeploymentRef, from: u32, to: u32) -> String {
    format!("{target} scaled: {from} -> {to} replicas")
}
