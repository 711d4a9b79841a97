//! rudder-kube — `ClusterGateway` over the Kubernetes REST API.
//!
//! Talks plain HTTP/1 to an already-authenticated API endpoint, which
//! in practice means a local `kubectl proxy` (optionally with a static
//! bearer token for direct endpoints). Cluster authentication itself
//! is out of scope.
//!
//! Wire JSON is decoded and validated in [`convert`]; the rest of the
//! toolkit only ever sees typed snapshots.

mod convert;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rudder_core::{
    ClusterGateway, DeploymentRef, DeploymentSnapshot, DeploymentSummary, GatewayError,
    GatewayResult, LogOptions, PodSnapshot,
};

use convert::{
    DeploymentObject, ObjectList, PodObject, decode, deployment_snapshot, deployment_summary,
    encode_query_value, label_selector, pod_snapshot,
};

/// Annotation bumped to trigger a rollout restart, mirroring kubectl.
const RESTART_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Gateway speaking to one cluster API endpoint.
#[derive(Debug, Clone)]
pub struct KubeGateway {
    authority: String,
    bearer_token: Option<String>,
    tls_requested: bool,
}

impl KubeGateway {
    /// Default endpoint of a local `kubectl proxy`.
    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8001";

    pub fn new(api_url: &str, bearer_token: Option<String>) -> Self {
        let tls_requested = api_url.starts_with("https://");
        let authority = api_url
            .strip_prefix("http://")
            .or_else(|| api_url.strip_prefix("https://"))
            .unwrap_or(api_url)
            .trim_end_matches('/')
            .to_string();
        Self {
            authority,
            bearer_token,
            tls_requested,
        }
    }

    /// Open a connection and send one request.
    async fn send(
        &self,
        method: http::Method,
        path: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> GatewayResult<hyper::Response<Incoming>> {
        if self.tls_requested {
            return Err(GatewayError::Unavailable(
                "https endpoints are not supported; point rudder at an authenticated proxy"
                    .to_string(),
            ));
        }

        let stream = tokio::net::TcpStream::connect(&self.authority)
            .await
            .map_err(|e| {
                GatewayError::Unavailable(format!("connect {}: {e}", self.authority))
            })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| GatewayError::Unavailable(format!("handshake: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(path)
            .header("host", &self.authority)
            .header("user-agent", "rudder/0.1")
            .header("accept", "application/json");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| GatewayError::Unavailable(format!("build request: {e}")))?;

        sender
            .send_request(request)
            .await
            .map_err(|e| GatewayError::Unavailable(format!("request: {e}")))
    }

    /// Send a request and collect the response body. 404 becomes
    /// `NotFound` for `what`; any other non-2xx is `Unavailable`.
    async fn request(
        &self,
        method: http::Method,
        path: &str,
        what: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> GatewayResult<Bytes> {
        debug!(%method, path, "cluster api request");
        let response = self.send(method, path, content_type, body).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("read response: {e}")))?
            .to_bytes();

        if status == http::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            warn!(path, %status, "cluster api returned an error status");
            return Err(GatewayError::Unavailable(format!(
                "{path} returned {status}"
            )));
        }
        Ok(body)
    }

    async fn get_deployment_object(
        &self,
        target: &DeploymentRef,
    ) -> GatewayResult<DeploymentObject> {
        let path = deployment_path(target);
        let body = self
            .request(http::Method::GET, &path, &target.to_string(), None, Bytes::new())
            .await?;
        decode(&body)
    }
}

impl ClusterGateway for KubeGateway {
    async fn get_deployment(&self, target: &DeploymentRef) -> GatewayResult<DeploymentSnapshot> {
        deployment_snapshot(self.get_deployment_object(target).await?)
    }

    async fn list_pods(&self, target: &DeploymentRef) -> GatewayResult<Vec<PodSnapshot>> {
        // The pod set is recomputed from the label selector on every
        // call, as one batched read.
        let deployment = self.get_deployment_object(target).await?;
        let selector = label_selector(&deployment)?;
        let path = format!(
            "/api/v1/namespaces/{}/pods?labelSelector={}",
            target.namespace,
            encode_query_value(&selector)
        );
        let body = self
            .request(http::Method::GET, &path, &target.to_string(), None, Bytes::new())
            .await?;
        let list: ObjectList<PodObject> = decode(&body)?;
        Ok(list.items.into_iter().map(pod_snapshot).collect())
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> GatewayResult<Vec<DeploymentSummary>> {
        let path = match namespace {
            Some(ns) => format!("/apis/apps/v1/namespaces/{ns}/deployments"),
            None => "/apis/apps/v1/deployments".to_string(),
        };
        let body = self
            .request(http::Method::GET, &path, "deployments", None, Bytes::new())
            .await?;
        let list: ObjectList<DeploymentObject> = decode(&body)?;
        Ok(list
            .items
            .iter()
            .filter(|d| !d.metadata.name.is_empty())
            .map(deployment_summary)
            .collect())
    }

    async fn trigger_restart(&self, target: &DeploymentRef) -> GatewayResult<()> {
        let patch = serde_json::json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            RESTART_ANNOTATION: chrono::Utc::now().to_rfc3339(),
                        }
                    }
                }
            }
        });
        self.request(
            http::Method::PATCH,
            &deployment_path(target),
            &target.to_string(),
            Some("application/strategic-merge-patch+json"),
            Bytes::from(patch.to_string()),
        )
        .await?;
        debug!(deployment = %target, "restart annotation bumped");
        Ok(())
    }

    async fn scale(&self, target: &DeploymentRef, replicas: u32) -> GatewayResult<()> {
        let patch = serde_json::json!({"spec": {"replicas": replicas}});
        let path = format!("{}/scale", deployment_path(target));
        self.request(
            http::Method::PATCH,
            &path,
            &target.to_string(),
            Some("application/merge-patch+json"),
            Bytes::from(patch.to_string()),
        )
        .await?;
        debug!(deployment = %target, replicas, "scale patched");
        Ok(())
    }

    async fn stream_logs(
        &self,
        namespace: &str,
        pod: &str,
        opts: &LogOptions,
    ) -> GatewayResult<mpsc::Receiver<String>> {
        let mut path = format!("/api/v1/namespaces/{namespace}/pods/{pod}/log");
        let mut sep = '?';
        if let Some(tail) = opts.tail_lines {
            path.push_str(&format!("{sep}tailLines={tail}"));
            sep = '&';
        }
        if opts.follow {
            path.push_str(&format!("{sep}follow=true"));
        }

        let response = self
            .send(http::Method::GET, &path, None, Bytes::new())
            .await?;
        let status = response.status();
        if status == http::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(format!("{namespace}/{pod}")));
        }
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!(
                "{path} returned {status}"
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut body = response.into_body();
        tokio::spawn(async move {
            let mut buffer = Vec::new();
            while let Some(frame) = body.frame().await {
                let Ok(frame) = frame else { break };
                if let Some(data) = frame.data_ref() {
                    for line in split_lines(&mut buffer, data) {
                        if tx.send(line).await.is_err() {
                            // Receiver dropped: the caller stopped
                            // consuming, stop following.
                            return;
                        }
                    }
                }
            }
            if !buffer.is_empty() {
                let _ = tx.send(String::from_utf8_lossy(&buffer).into_owned()).await;
            }
        });
        Ok(rx)
    }
}

fn deployment_path(target: &DeploymentRef) -> String {
    format!(
        "/apis/apps/v1/namespaces/{}/deployments/{}",
        target.namespace, target.name
    )
}

/// Append a chunk to the carry-over buffer and drain complete lines.
fn split_lines(buffer: &mut Vec<u8>, data: &[u8]) -> Vec<String> {
    buffer.extend_from_slice(data);
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned());
    }
    lines
}
