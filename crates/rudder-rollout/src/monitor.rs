//! Rollout monitor — restart side effect plus the polling loop.
//!
//! One invocation drives one rollout: trigger the restart, then read a
//! fresh snapshot every `poll_interval` and apply the transition
//! function until a terminal state or the deadline. Cluster reads are
//! the only thing retried here; state transitions are re-evaluated on
//! the next poll, never retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use rudder_core::config::DEFAULT_FETCH_RETRY_LIMIT;
use rudder_core::{
    ClusterGateway, DeploymentRef, DeploymentSnapshot, GatewayError, OpsError, OpsResult,
    PodSnapshot,
};

use crate::progress::{PollObservation, RestartTracker, RolloutState, next_state};

/// Terminal outcome of one monitored rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutResult {
    pub final_state: RolloutState,
    pub elapsed: Duration,
    pub last_snapshot: DeploymentSnapshot,
}

/// Drives and observes one restart-rollout to completion or failure.
pub struct RolloutMonitor<G> {
    gateway: G,
    retry_limit: u32,
}

impl<G: ClusterGateway> RolloutMonitor<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            retry_limit: DEFAULT_FETCH_RETRY_LIMIT,
        }
    }

    /// Override the consecutive-fetch-failure bound.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Restart the deployment and poll until the rollout reaches a
    /// terminal state or `timeout` expires.
    pub async fn restart(
        &self,
        target: &DeploymentRef,
        timeout: Duration,
        poll_interval: Duration,
    ) -> OpsResult<RolloutResult> {
        validate(target, timeout, poll_interval)?;

        let pre = self.gateway.get_deployment(target).await?;
        let start_generation = pre.observed_generation;

        self.gateway.trigger_restart(target).await?;
        info!(deployment = %target, start_generation, "restart triggered");

        let started = Instant::now();
        let mut state = RolloutState::Pending;
        let mut tracker = RestartTracker::new();
        let mut consecutive_failures = 0u32;
        let mut max_observed = start_generation;
        let mut last_snapshot = pre;

        loop {
            if started.elapsed() >= timeout {
                state = RolloutState::TimedOut;
                break;
            }
            tokio::time::sleep(poll_interval).await;

            let snapshot = match self.gateway.get_deployment(target).await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    snapshot
                }
                Err(err) => {
                    self.absorb_fetch_error(target, err, &mut consecutive_failures)?;
                    continue;
                }
            };

            if snapshot.observed_generation < max_observed {
                // Stale read: a generation we have already moved past.
                // Discard and re-poll rather than applying a transition.
                debug!(
                    deployment = %target,
                    observed = snapshot.observed_generation,
                    max_observed,
                    "discarding stale snapshot"
                );
                continue;
            }
            max_observed = snapshot.observed_generation;

            let pods = match self.gateway.list_pods(target).await {
                Ok(pods) => {
                    consecutive_failures = 0;
                    pods
                }
                Err(err) => {
                    self.absorb_fetch_error(target, err, &mut consecutive_failures)?;
                    continue;
                }
            };

            let observation = tracker.observe(&pods);
            state = next_state(&state, start_generation, &snapshot, &pods, &observation);
            last_snapshot = snapshot;

            debug!(
                deployment = %target,
                state = state.label(),
                updated = last_snapshot.updated_replicas,
                available = last_snapshot.available_replicas,
                desired = last_snapshot.desired_replicas,
                "poll applied"
            );

            if state.is_terminal() {
                break;
            }
        }

        let result = RolloutResult {
            final_state: state,
            elapsed: started.elapsed(),
            last_snapshot,
        };
        info!(
            deployment = %target,
            outcome = result.final_state.label(),
            elapsed_secs = result.elapsed.as_secs(),
            "rollout finished"
        );
        Ok(result)
    }

    /// Single-shot transition evaluation for out-of-band status
    /// queries: one snapshot, no polling loop.
    pub async fn status(&self, target: &DeploymentRef) -> OpsResult<RolloutState> {
        if target.name.is_empty() {
            return Err(OpsError::Validation(
                "deployment name must not be empty".to_string(),
            ));
        }

        let snapshot = self.gateway.get_deployment(target).await?;
        let pods = self.gateway.list_pods(target).await?;

        // Pending until the controller has observed the latest
        // generation; one observation cannot detect crash loops.
        let observation = RestartTracker::new().observe(&pods);
        let state = next_state(
            &RolloutState::Pending,
            snapshot.generation - 1,
            &snapshot,
            &pods,
            &observation,
        );

        info!(deployment = %target, state = state.label(), "rollout status read");
        Ok(state)
    }

    /// Absorb a poll fetch error up to the retry bound, escalating
    /// past it. `NotFound` is never retried.
    fn absorb_fetch_error(
        &self,
        target: &DeploymentRef,
        err: GatewayError,
        consecutive_failures: &mut u32,
    ) -> OpsResult<()> {
        match err {
            GatewayError::NotFound(what) => Err(OpsError::NotFound(what)),
            GatewayError::Unavailable(why) => {
                *consecutive_failures += 1;
                if *consecutive_failures > self.retry_limit {
                    return Err(OpsError::GatewayUnavailable(why));
                }
                warn!(
                    deployment = %target,
                    consecutive = *consecutive_failures,
                    limit = self.retry_limit,
                    error = %why,
                    "poll fetch failed, retrying"
                );
                Ok(())
            }
        }
    }
}

fn validate(target: &DeploymentRef, timeout: Duration, poll_interval: Duration) -> OpsResult<()> {
    if target.name.is_empty() {
        return Err(OpsError::Validation(
            "deployment name must not be empty".to_string(),
        ));
    }
    if poll_interval.is_zero() {
        return Err(OpsError::Validation(
            "poll interval must be positive".to_string(),
        ));
    }
    if timeout <= poll_interval {
        return Err(OpsError::Validation(
            "timeout must be longer than the poll interval".to_string(),
        ));
    }
    Ok(())
}
