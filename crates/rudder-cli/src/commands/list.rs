use tracing::info;

use rudder_core::{ClusterGateway, DeploymentSummary, OpsResult};

pub async fn run<G: ClusterGateway>(gateway: G, namespace: Option<&str>) -> OpsResult<u8> {
    let rows = gateway.list_deployments(namespace).await?;
    info!(
        namespace = namespace.unwrap_or("<all>"),
        rows = rows.len(),
        "deployments listed"
    );
    println!("{}", render(&rows));
    Ok(0)
}

fn render(rows: &[DeploymentSummary]) -> String {
    if rows.is_empty() {
        return "no deployments found".to_string();
    }

    let ns_width = rows
        .iter()
        .map(|r| r.namespace.len())
        .chain(["NAMESPACE".len()].into_iter())
        .max()
        .unwrap_or(0);
    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(["NAME".len()].into_iter())
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<ns_width$}  {:<name_width$}  READY", "NAMESPACE", "NAME");
    for row in rows {
        out.push_str(&format!(
            "\n{:<ns_width$}  {:<name_width$}  {}/{}",
            row.namespace, row.name, row.available_replicas, row.desired_replicas
        ));
    }
    out
}
