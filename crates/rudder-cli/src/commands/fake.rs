//! Canned-response gateway shared by the command tests.

use std::sync::Mutex;

use tokio::sync::mpsc;

use rudder_core::{
    ClusterGateway, DeploymentRef, DeploymentSnapshot, DeploymentSummary, GatewayError,
    GatewayResult, LogOptions, PodSnapshot,
};

#[derive(Default)]
pub struct FakeGateway {
    pub deployments: Vec<DeploymentSnapshot>,
    pub pods: Vec<PodSnapshot>,
    pub log_lines: Vec<String>,
    pub scaled: Mutex<Vec<(DeploymentRef, u32)>>,
    pub restarted: Mutex<Vec<DeploymentRef>>,
}

impl FakeGateway {
    pub fn with_deployments(deployments: Vec<DeploymentSnapshot>) -> Self {
        Self {
            deployments,
            ..Default::default()
        }
    }
}

impl ClusterGateway for FakeGateway {
    async fn get_deployment(&self, target: &DeploymentRef) -> GatewayResult<DeploymentSnapshot> {
        self.deployments
            .iter()
            .find(|d| d.name == target.name && d.namespace == target.namespace)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(target.to_string()))
    }

    async fn list_pods(&self, _target: &DeploymentRef) -> GatewayResult<Vec<PodSnapshot>> {
        Ok(self.pods.clone())
    }

    async fn list_deployments(
        &self,
        namespace: Option<&str>,
    ) -> GatewayResult<Vec<DeploymentSummary>> {
        Ok(self
            .deployments
            .iter()
            .filter(|d| namespace.is_none_or(|ns| d.namespace == ns))
            .map(|d| DeploymentSummary {
                name: d.name.clone(),
                namespace: d.namespace.clone(),
                desired_replicas: d.desired_replicas,
                available_replicas: d.available_replicas,
            })
            .collect())
    }

    async fn trigger_restart(&self, target: &DeploymentRef) -> GatewayResult<()> {
        self.restarted.lock().unwrap().push(target.clone());
        Ok(())
    }

    async fn scale(&self, target: &DeploymentRef, replicas: u32) -> GatewayResult<()> {
        self.scaled.lock().unwrap().push((target.clone(), replicas));
        Ok(())
    }

    async fn stream_logs(
        &self,
        _namespace: &str,
        _pod: &str,
        _opts: &LogOptions,
    ) -> GatewayResult<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(64);
        for line in self.log_lines.clone() {
            tx.try_send(line).unwrap();
        }
        Ok(rx)
    }
}

pub fn snapshot(name: &str, namespace: &str, desired: u32, available: u32) -> DeploymentSnapshot {
    DeploymentSnapshot {
        name: name.to_string(),
        namespace: namespace.to_string(),
        desired_replicas: desired,
        updated_replicas: available,
        available_replicas: available,
        ready_replicas: available,
        generation: 1,
        observed_generation: 1,
        conditions: Vec::new(),
        labels: Default::default(),
        created_at: None,
    }
}
