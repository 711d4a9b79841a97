use std::time::Duration;

use rudder_core::{ClusterGateway, DeploymentRef, OpsResult, resolve_deployment};
use rudder_rollout::{FailureReason, RolloutMonitor, RolloutResult, RolloutState};

pub async fn restart<G: ClusterGateway>(
    gateway: G,
    name: &str,
    namespace: Option<&str>,
    timeout: Duration,
    poll_interval: Duration,
    retry_limit: u32,
) -> OpsResult<u8> {
    let target = resolve_deployment(&gateway, name, namespace).await?;
    let monitor = RolloutMonitor::new(gateway).with_retry_limit(retry_limit);
    let result = monitor.restart(&target, timeout, poll_interval).await?;
    println!("{}", render_result(&target, &result));
    Ok(state_exit_code(&result.final_state))
}

pub async fn status<G: ClusterGateway>(
    gateway: G,
    name: &str,
    namespace: Option<&str>,
) -> OpsResult<u8> {
    let target = resolve_deployment(&gateway, name, namespace).await?;
    let state = RolloutMonitor::new(gateway).status(&target).await?;
    println!("{}", render_state(&target, &state));
    Ok(state_exit_code(&state))
}

/// 0 success, 1 failed rollout, 2 timed out. Non-terminal states are
/// not process failures.
fn state_exit_code(state: &RolloutState) -> u8 {
    match state {
        RolloutState::Failed { .. } => 1,
        RolloutState::TimedOut => 2,
        _ => 0,
    }
}

fn render_result(target: &DeploymentRef, result: &RolloutResult) -> String {
    let elapsed = result.elapsed.as_secs();
    match &result.final_state {
        RolloutState::Complete => format!(
            "{target}: rollout complete in {elapsed}s ({}/{} available)",
            result.last_snapshot.available_replicas, result.last_snapshot.desired_replicas
        ),
        RolloutState::TimedOut => format!(
            "{target}: rollout timed out after {elapsed}s ({}/{} available)",
            result.last_snapshot.available_replicas, result.last_snapshot.desired_replicas
        ),
        RolloutState::Failed { reason } => {
            format!("{target}: rollout failed, {}", failure_label(reason))
        }
        other => format!("{target}: rollout {}", other.label()),
    }
}

fn render_state(target: &DeploymentRef, state: &RolloutState) -> String {
    match state {
        RolloutState::Failed { reason } => {
            format!("{target}: failed, {}", failure_label(reason))
        }
        other => format!("{target}: {}", other.label()),
    }
}

fn failure_label(reason: &FailureReason) -> String {
    match reason {
        FailureReason::CrashLoop { pod } => format!("pod {pod} is crash looping"),
        FailureReason::PodFailed { pod } => format!("pod {pod} entered the Failed phase"),
    }
}
