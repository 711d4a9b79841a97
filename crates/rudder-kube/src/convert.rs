//! Wire-format decoding for Kubernetes API objects.
//!
//! The API server's loosely-typed JSON is validated here, at the
//! gateway boundary, and turned into the typed snapshot model. Nothing
//! above this module ever inspects raw maps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use rudder_core::{
    ConditionStatus, ContainerStatus, DeploymentCondition, DeploymentSnapshot, DeploymentSummary,
    GatewayError, GatewayResult, PodPhase, PodSnapshot,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    pub generation: Option<i64>,
    pub labels: Option<HashMap<String, String>>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeploymentObject {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DeploymentSpecObject,
    #[serde(default)]
    pub status: DeploymentStatusObject,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeploymentSpecObject {
    pub replicas: Option<u32>,
    pub selector: Option<LabelSelector>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LabelSelector {
    pub match_labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeploymentStatusObject {
    pub updated_replicas: Option<u32>,
    pub available_replicas: Option<u32>,
    pub ready_replicas: Option<u32>,
    pub observed_generation: Option<i64>,
    pub conditions: Option<Vec<ConditionObject>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConditionObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PodObject {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: PodStatusObject,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PodStatusObject {
    pub phase: Option<String>,
    pub container_statuses: Option<Vec<ContainerStatusObject>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerStatusObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub restart_count: u32,
    pub last_state: Option<ContainerStateObject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerStateObject {
    pub terminated: Option<TerminatedStateObject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TerminatedStateObject {
    pub reason: Option<String>,
}

pub(crate) fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> GatewayResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::Unavailable(format!("unexpected response body: {e}")))
}

/// Validate a deployment object and build its snapshot.
pub(crate) fn deployment_snapshot(obj: DeploymentObject) -> GatewayResult<DeploymentSnapshot> {
    if obj.metadata.name.is_empty() {
        return Err(GatewayError::Unavailable(
            "deployment object without a name".to_string(),
        ));
    }

    let conditions = obj
        .status
        .conditions
        .unwrap_or_default()
        .into_iter()
        .map(|c| DeploymentCondition {
            kind: c.kind,
            status: ConditionStatus::parse(&c.status),
            reason: c.reason,
            message: c.message,
            last_transition_time: c.last_transition_time,
        })
        .collect();

    Ok(DeploymentSnapshot {
        name: obj.metadata.name,
        namespace: obj.metadata.namespace,
        desired_replicas: obj.spec.replicas.unwrap_or(0),
        updated_replicas: obj.status.updated_replicas.unwrap_or(0),
        available_replicas: obj.status.available_replicas.unwrap_or(0),
        ready_replicas: obj.status.ready_replicas.unwrap_or(0),
        generation: obj.metadata.generation.unwrap_or(0),
        observed_generation: obj.status.observed_generation.unwrap_or(0),
        conditions,
        labels: obj.metadata.labels.unwrap_or_default(),
        created_at: obj.metadata.creation_timestamp,
    })
}

pub(crate) fn deployment_summary(obj: &DeploymentObject) -> DeploymentSummary {
    DeploymentSummary {
        name: obj.metadata.name.clone(),
        namespace: obj.metadata.namespace.clone(),
        desired_replicas: obj.spec.replicas.unwrap_or(0),
        available_replicas: obj.status.available_replicas.unwrap_or(0),
    }
}

/// Build a pod snapshot. A pod with no container statuses is not
/// ready, matching how the cluster reports freshly scheduled pods.
pub(crate) fn pod_snapshot(obj: PodObject) -> PodSnapshot {
    let containers: Vec<ContainerStatus> = obj
        .status
        .container_statuses
        .unwrap_or_default()
        .into_iter()
        .map(|c| ContainerStatus {
            name: c.name,
            ready: c.ready,
            restart_count: c.restart_count,
            last_termination_reason: c
                .last_state
                .and_then(|s| s.terminated)
                .and_then(|t| t.reason),
        })
        .collect();

    let ready = !containers.is_empty() && containers.iter().all(|c| c.ready);
    let restart_count = containers.iter().map(|c| c.restart_count).max().unwrap_or(0);

    PodSnapshot {
        name: obj.metadata.name,
        phase: PodPhase::parse(obj.status.phase.as_deref().unwrap_or("")),
        ready,
        restart_count,
        containers,
    }
}

/// Extract the deployment's label selector as a `k=v,...` expression.
pub(crate) fn label_selector(obj: &DeploymentObject) -> GatewayResult<String> {
    let labels = obj
        .spec
        .selector
        .as_ref()
        .and_then(|s| s.match_labels.as_ref())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            GatewayError::Unavailable(format!(
                "deployment {} has no label selector",
                obj.metadata.name
            ))
        })?;

    let mut pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    Ok(pairs.join(","))
}

/// Percent-encode a query parameter value.
pub(crate) fn encode_query_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
