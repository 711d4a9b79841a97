//! Rollout state machine.
//!
//! `next_state` is a pure function of the previous state, the rollout's
//! starting generation, and one fresh snapshot pair; the monitor applies
//! it strictly in poll order. `RestartTracker` carries the only history
//! the function needs: per-pod restart counts across consecutive polls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use rudder_core::{DeploymentSnapshot, PodPhase, PodSnapshot};

/// Where one rollout currently stands. Held only for the duration of a
/// single monitor invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutState {
    /// The controller has not yet picked up the restart.
    Pending,
    /// New replicas are being rolled in under the given generation.
    Progressing { observed_generation: i64 },
    /// All replicas updated, available, and ready.
    Complete,
    /// The rollout cannot finish without intervention.
    Failed { reason: FailureReason },
    /// The deadline expired before a terminal outcome.
    TimedOut,
}

impl RolloutState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RolloutState::Complete | RolloutState::Failed { .. } | RolloutState::TimedOut
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            RolloutState::Pending => "pending",
            RolloutState::Progressing { .. } => "progressing",
            RolloutState::Complete => "complete",
            RolloutState::Failed { .. } => "failed",
            RolloutState::TimedOut => "timed-out",
        }
    }
}

/// Why a rollout failed. Distinct variants, not message strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// A pod kept restarting on consecutive polls without ever
    /// reaching Ready.
    CrashLoop { pod: String },
    /// A pod reached the Failed phase with no further retries.
    PodFailed { pod: String },
}

/// What one poll's pod readings add up to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollObservation {
    /// Some pod's restart count increased since the previous poll.
    pub restarts_bumped: bool,
    /// A pod restarted on two consecutive polls without ever going
    /// Ready.
    pub crash_looping: Option<String>,
}

#[derive(Debug, Clone)]
struct PodHistory {
    last_restart_count: u32,
    consecutive_increases: u32,
    ever_ready: bool,
}

/// Tracks restart counts across polls to spot crash loops.
///
/// Pods that disappear between polls (replaced during the rollout) are
/// dropped from the history; a pod is only flagged once its restart
/// count has grown on two consecutive polls while it never reported
/// Ready.
#[derive(Debug, Default)]
pub struct RestartTracker {
    pods: HashMap<String, PodHistory>,
}

impl RestartTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one poll's pod snapshots into the history.
    pub fn observe(&mut self, pods: &[PodSnapshot]) -> PollObservation {
        let mut observation = PollObservation::default();

        for pod in pods {
            let entry = self
                .pods
                .entry(pod.name.clone())
                .or_insert_with(|| PodHistory {
                    last_restart_count: pod.restart_count,
                    consecutive_increases: 0,
                    ever_ready: false,
                });

            if pod.restart_count > entry.last_restart_count {
                entry.consecutive_increases += 1;
                observation.restarts_bumped = true;
            } else {
                // A quiet poll breaks the consecutive streak.
                entry.consecutive_increases = 0;
            }
            entry.last_restart_count = pod.restart_count;
            entry.ever_ready |= pod.ready;

            if !entry.ever_ready
                && entry.consecutive_increases >= 2
                && observation.crash_looping.is_none()
            {
                observation.crash_looping = Some(pod.name.clone());
            }
        }

        // Forget pods the rollout has already replaced.
        self.pods.retain(|name, _| pods.iter().any(|p| &p.name == name));

        observation
    }
}

/// Apply the transition function to one fresh snapshot.
///
/// Evaluation order: not-yet-observed stays `Pending`; failure evidence
/// (crash loop, Failed pod) wins over progress; otherwise the replica
/// and readiness counts decide between `Progressing` and `Complete`.
/// A state that already left `Pending` never regresses to it.
pub fn next_state(
    prev: &RolloutState,
    start_generation: i64,
    snapshot: &DeploymentSnapshot,
    pods: &[PodSnapshot],
    observation: &PollObservation,
) -> RolloutState {
    if snapshot.observed_generation <= start_generation {
        // The controller has not acknowledged the restart yet.
        return match prev {
            RolloutState::Pending => RolloutState::Pending,
            other => other.clone(),
        };
    }

    if let Some(pod) = &observation.crash_looping {
        return RolloutState::Failed {
            reason: FailureReason::CrashLoop { pod: pod.clone() },
        };
    }

    if let Some(pod) = pods.iter().find(|p| p.phase == PodPhase::Failed) {
        return RolloutState::Failed {
            reason: FailureReason::PodFailed {
                pod: pod.name.clone(),
            },
        };
    }

    if snapshot.updated_replicas < snapshot.desired_replicas || pods.iter().any(|p| !p.ready) {
        return RolloutState::Progressing {
            observed_generation: snapshot.observed_generation,
        };
    }

    if snapshot.available_replicas == snapshot.desired_replicas && !observation.restarts_bumped {
        return RolloutState::Complete;
    }

    RolloutState::Progressing {
        observed_generation: snapshot.observed_generation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(observed: i64, desired: u32, updated: u32, available: u32) -> DeploymentSnapshot {
        DeploymentSnapshot {
            name: "api".to_string(),
            namespace: "default".to_string(),
            desired_replicas: desired,
            updated_replicas: updated,
            available_replicas: available,
            ready_replicas: available,
            generation: observed,
            observed_generation: observed,
            conditions: Vec::new(),
            labels: Default::default(),
            created_at: None,
        }
    }

    fn pod(name: &str, ready: bool, restart_count: u32) -> PodSnapshot {
        PodSnapshot {
            name: name.to_string(),
            phase: if ready {
                PodPhase::Running
            } else {
                PodPhase::Pending
            },
            ready,
            restart_count,
            containers: Vec::new(),
        }
    }

    #[test]
    fn stays_pending_until_generation_advances() {
        let state = next_state(
            &RolloutState::Pending,
            4,
            &snapshot(4, 3, 0, 3),
            &[],
            &PollObservation::default(),
        );
        assert_eq!(state, RolloutState::Pending);
    }

    #[test]
    fn progresses_while_replicas_update() {
        let state = next_state(
            &RolloutState::Pending,
            4,
            &snapshot(5, 3, 1, 1),
            &[pod("a", true, 0), pod("b", false, 0)],
            &PollObservation::default(),
        );
        assert_eq!(
            state,
            RolloutState::Progressing {
                observed_generation: 5
            }
        );
    }

    #[test]
    fn unready_pod_blocks_completion() {
        let state = next_state(
            &RolloutState::Pending,
            4,
            &snapshot(5, 2, 2, 2),
            &[pod("a", true, 0), pod("b", false, 0)],
            &PollObservation::default(),
        );
        assert!(matches!(state, RolloutState::Progressing { .. }));
    }

    #[test]
    fn completes_when_everything_is_ready() {
        let state = next_state(
            &RolloutState::Progressing {
                observed_generation: 5,
            },
            4,
            &snapshot(5, 3, 3, 3),
            &[pod("a", true, 0), pod("b", true, 0), pod("c", true, 0)],
            &PollObservation::default(),
        );
        assert_eq!(state, RolloutState::Complete);
    }

    #[test]
    fn unexpected_restart_defers_completion() {
        let state = next_state(
            &RolloutState::Progressing {
                observed_generation: 5,
            },
            4,
            &snapshot(5, 2, 2, 2),
            &[pod("a", true, 1), pod("b", true, 0)],
            &PollObservation {
                restarts_bumped: true,
                crash_looping: None,
            },
        );
        assert!(matches!(state, RolloutState::Progressing { .. }));
    }

    #[test]
    fn failed_pod_beats_progress() {
        let mut failed = pod("b", false, 0);
        failed.phase = PodPhase::Failed;
        let state = next_state(
            &RolloutState::Progressing {
                observed_generation: 5,
            },
            4,
            &snapshot(5, 2, 1, 1),
            &[pod("a", true, 0), failed],
            &PollObservation::default(),
        );
        assert_eq!(
            state,
            RolloutState::Failed {
                reason: FailureReason::PodFailed {
                    pod: "b".to_string()
                }
            }
        );
    }

    #[test]
    fn crash_loop_observation_fails_the_rollout() {
        let state = next_state(
            &RolloutState::Progressing {
                observed_generation: 5,
            },
            4,
            &snapshot(5, 2, 2, 1),
            &[pod("a", true, 0), pod("b", false, 4)],
            &PollObservation {
                restarts_bumped: true,
                crash_looping: Some("b".to_string()),
            },
        );
        assert_eq!(
            state,
            RolloutState::Failed {
                reason: FailureReason::CrashLoop {
                    pod: "b".to_string()
                }
            }
        );
    }

    #[test]
    fn never_regresses_to_pending_on_non_decreasing_generation() {
        // Once progressing, a snapshot that still carries the start
        // generation must not pull the state back to Pending.
        let progressing = RolloutState::Progressing {
            observed_generation: 5,
        };
        let state = next_state(
            &progressing,
            5,
            &snapshot(5, 3, 1, 1),
            &[],
            &PollObservation::default(),
        );
        assert_eq!(state, progressing);
    }

    #[test]
    fn tracker_flags_two_consecutive_increases_without_ready() {
        let mut tracker = RestartTracker::new();

        let first = tracker.observe(&[pod("b", false, 1)]);
        assert_eq!(first.crash_looping, None);

        let second = tracker.observe(&[pod("b", false, 2)]);
        assert!(second.restarts_bumped);
        assert_eq!(second.crash_looping, None);

        let third = tracker.observe(&[pod("b", false, 3)]);
        assert_eq!(third.crash_looping, Some("b".to_string()));
    }

    #[test]
    fn tracker_does_not_flag_pod_that_reached_ready() {
        let mut tracker = RestartTracker::new();
        tracker.observe(&[pod("b", true, 1)]);
        tracker.observe(&[pod("b", false, 2)]);
        let observation = tracker.observe(&[pod("b", false, 3)]);
        assert!(observation.restarts_bumped);
        assert_eq!(observation.crash_looping, None);
    }

    #[test]
    fn tracker_streak_breaks_on_quiet_poll() {
        let mut tracker = RestartTracker::new();
        tracker.observe(&[pod("b", false, 1)]);
        tracker.observe(&[pod("b", false, 2)]);
        // No increase this poll: streak resets.
        tracker.observe(&[pod("b", false, 2)]);
        let observation = tracker.observe(&[pod("b", false, 3)]);
        assert_eq!(observation.crash_looping, None);
    }

    #[test]
    fn tracker_forgets_replaced_pods() {
        let mut tracker = RestartTracker::new();
        tracker.observe(&[pod("old", false, 1)]);
        tracker.observe(&[pod("old", false, 2)]);

        // The rollout replaced the pod; a fresh pod with the same
        // restart count must start from a clean history.
        let observation = tracker.observe(&[pod("new", false, 2)]);
        assert!(!observation.restarts_bumped);
        assert_eq!(observation.crash_looping, None);
    }
}
