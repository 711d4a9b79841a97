use rudder_core::{ClusterGateway, LogOptions, OpsError, OpsResult, resolve_deployment};

/// What to fetch logs for: one pod directly, or every pod of a
/// deployment.
pub enum LogTarget {
    Pod(String),
    Deployment(String),
}

pub async fn run<G: ClusterGateway>(
    gateway: G,
    target: LogTarget,
    namespace: Option<&str>,
    opts: &LogOptions,
) -> OpsResult<u8> {
    match target {
        LogTarget::Pod(pod) => {
            let namespace = namespace.ok_or_else(|| {
                OpsError::Validation("--namespace is required with --pod".to_string())
            })?;
            stream_one(&gateway, namespace, &pod, opts, false).await?;
        }
        LogTarget::Deployment(name) => {
            let target = resolve_deployment(&gateway, &name, namespace).await?;
            let pods = gateway.list_pods(&target).await?;
            if pods.is_empty() {
                println!("no pods found for {target}");
                return Ok(0);
            }
            if opts.follow && pods.len() > 1 {
                return Err(OpsError::Validation(
                    "--follow works on a single pod; pass --pod to pick one".to_string(),
                ));
            }
            let header = pods.len() > 1;
            for pod in &pods {
                stream_one(&gateway, &target.namespace, &pod.name, opts, header).await?;
            }
        }
    }
    Ok(0)
}

async fn stream_one<G: ClusterGateway>(
    gateway: &G,
    namespace: &str,
    pod: &str,
    opts: &LogOptions,
    header: bool,
) -> OpsResult<()> {
    if header {
        println!("==> {pod} <==");
    }
    let mut lines = gateway.stream_logs(namespace, pod, opts).await?;
    while let Some(line) = lines.recv().await {
        println!("{line}");
    }
    Ok(())
}
