//! Cluster gateway contract.
//!
//! The gateway is the only component that talks to the cluster API.
//! Everything above it works on validated snapshots, so a fake gateway
//! with scripted responses is enough to exercise the rollout monitor
//! and diagnostic engine end to end.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{OpsError, OpsResult};
use crate::types::{DeploymentRef, DeploymentSnapshot, DeploymentSummary, PodSnapshot};

/// Result type alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors a gateway call can produce.
///
/// `Clone` so scripted test gateways can replay canned errors.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient read/write failure: connection refused, non-2xx
    /// status, malformed response body.
    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// Options for a log fetch.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Number of trailing lines to fetch; `None` for the full log.
    pub tail_lines: Option<u32>,
    /// Keep the stream open and follow new lines until the pod
    /// terminates or the receiver is dropped.
    pub follow: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            tail_lines: Some(100),
            follow: false,
        }
    }
}

/// Read/write access to deployment and pod resources.
///
/// Implementations return point-in-time snapshots; consecutive calls
/// are never assumed to be consistent with each other. Pods for one
/// deployment are fetched as a single batched read.
pub trait ClusterGateway {
    /// Fetch a fresh snapshot of one deployment.
    async fn get_deployment(&self, target: &DeploymentRef) -> GatewayResult<DeploymentSnapshot>;

    /// Fetch all pods matching the deployment's label selector.
    async fn list_pods(&self, target: &DeploymentRef) -> GatewayResult<Vec<PodSnapshot>>;

    /// List deployments in one namespace, or across all namespaces.
    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> GatewayResult<Vec<DeploymentSummary>>;

    /// Bump the pod-template restart annotation, triggering a new
    /// rollout generation.
    async fn trigger_restart(&self, target: &DeploymentRef) -> GatewayResult<()>;

    /// Patch the deployment's replica count.
    async fn scale(&self, target: &DeploymentRef, replicas: u32) -> GatewayResult<()>;

    /// Stream log lines for one pod. The channel closes when the log
    /// ends (or, with `follow`, when the pod terminates).
    async fn stream_logs(
        &self,
        namespace: &str,
        pod: &str,
        opts: &LogOptions,
    ) -> GatewayResult<mpsc::Receiver<String>>;
}

impl<G: ClusterGateway> ClusterGateway for &G {
    async fn get_deployment(&self, target: &DeploymentRef) -> GatewayResult<DeploymentSnapshot> {
        (**self).get_deployment(target).await
    }

    async fn list_pods(&self, target: &DeploymentRef) -> GatewayResult<Vec<PodSnapshot>> {
        (**self).list_pods(target).await
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> GatewayResult<Vec<DeploymentSummary>> {
        (**self).list_deployments(namespace).await
    }

    async fn trigger_restart(&self, target: &DeploymentRef) -> GatewayResult<()> {
        (**self).trigger_restart(target).await
    }

    async fn scale(&self, target: &DeploymentRef, replicas: u32) -> GatewayResult<()> {
        (**self).scale(target, replicas).await
    }

    async fn stream_logs(
        &self,
        namespace: &str,
        pod: &str,
        opts: &LogOptions,
    ) -> GatewayResult<mpsc::Receiver<String>> {
        (**self).stream_logs(namespace, pod, opts).await
    }
}

/// Resolve a deployment name to a full reference.
///
/// With a namespace the deployment is looked up directly. Without one,
/// all namespaces are searched: zero matches is `NotFound`, more than
/// one is `AmbiguousTarget`.
pub async fn resolve_deployment<G: ClusterGateway>(
    gateway: &G,
    name: &str,
    namespace: Option<&str>,
) -> OpsResult<DeploymentRef> {
    if name.is_empty() {
        return Err(OpsError::Validation(
            "deployment name must not be empty".to_string(),
        ));
    }

    if let Some(ns) = namespace {
        let target = DeploymentRef::new(name, ns);
        // Confirm existence up front so later calls can assume it.
        gateway.get_deployment(&target).await?;
        return Ok(target);
    }

    let mut matches: Vec<DeploymentSummary> = gateway
        .list_deployments(None)
        .await?
        .into_iter()
        .filter(|d| d.name == name)
        .collect();

    debug!(name, candidates = matches.len(), "cross-namespace lookup");

    match matches.len() {
        0 => Err(OpsError::NotFound(name.to_string())),
        1 => {
            let hit = matches.remove(0);
            Ok(DeploymentRef::new(hit.name, hit.namespace))
        }
        _ => Err(OpsError::AmbiguousTarget {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal fixed-response gateway for lookup tests.
    struct ListOnly {
        rows: Vec<DeploymentSummary>,
    }

    impl ClusterGateway for ListOnly {
        async fn get_deployment(
            &self,
            target: &DeploymentRef,
        ) -> GatewayResult<DeploymentSnapshot> {
            let found = self
                .rows
                .iter()
                .any(|d| d.name == target.name && d.namespace == target.namespace);
            if !found {
                return Err(GatewayError::NotFound(target.to_string()));
            }
            Ok(DeploymentSnapshot {
                name: target.name.clone(),
                namespace: target.namespace.clone(),
                desired_replicas: 1,
                updated_replicas: 1,
                available_replicas: 1,
                ready_replicas: 1,
                generation: 1,
                observed_generation: 1,
                conditions: Vec::new(),
                labels: Default::default(),
                created_at: None,
            })
        }

        async fn list_pods(&self, _target: &DeploymentRef) -> GatewayResult<Vec<PodSnapshot>> {
            Ok(Vec::new())
        }

        async fn list_deployments(
            &self,
            namespace: Option<&str>,
        ) -> GatewayResult<Vec<DeploymentSummary>> {
            Ok(self
                .rows
                .iter()
                .filter(|d| namespace.is_none_or(|ns| d.namespace == ns))
                .cloned()
                .collect())
        }

        async fn trigger_restart(&self, _target: &DeploymentRef) -> GatewayResult<()> {
            Ok(())
        }

        async fn scale(&self, _target: &DeploymentRef, _replicas: u32) -> GatewayResult<()> {
            Ok(())
        }

        async fn stream_logs(
            &self,
            _namespace: &str,
            _pod: &str,
            _opts: &LogOptions,
        ) -> GatewayResult<mpsc::Receiver<String>> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    fn row(name: &str, namespace: &str) -> DeploymentSummary {
        DeploymentSummary {
            name: name.to_string(),
            namespace: namespace.to_string(),
            desired_replicas: 2,
            available_replicas: 2,
        }
    }

    #[tokio::test]
    async fn resolves_with_explicit_namespace() {
        let gateway = ListOnly {
            rows: vec![row("api", "prod")],
        };
        let target = resolve_deployment(&gateway, "api", Some("prod")).await.unwrap();
        assert_eq!(target, DeploymentRef::new("api", "prod"));
    }

    #[tokio::test]
    async fn explicit_namespace_miss_is_not_found() {
        let gateway = ListOnly {
            rows: vec![row("api", "prod")],
        };
        let err = resolve_deployment(&gateway, "api", Some("staging"))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::NotFound(_)));
    }

    #[tokio::test]
    async fn searches_all_namespaces_for_unique_name() {
        let gateway = ListOnly {
            rows: vec![row("api", "prod"), row("worker", "batch")],
        };
        let target = resolve_deployment(&gateway, "worker", None).await.unwrap();
        assert_eq!(target.namespace, "batch");
    }

    #[tokio::test]
    async fn duplicate_name_without_namespace_is_ambiguous() {
        let gateway = ListOnly {
            rows: vec![row("api", "prod"), row("api", "staging")],
        };
        let err = resolve_deployment(&gateway, "api", None).await.unwrap_err();
        assert!(matches!(err, OpsError::AmbiguousTarget { .. }));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_any_call() {
        let gateway = ListOnly { rows: Vec::new() };
        let err = resolve_deployment(&gateway, "", None).await.unwrap_err();
        assert!(matches!(err, OpsError::Validation(_)));
    }
}
