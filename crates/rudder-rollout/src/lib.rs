//! rudder-rollout — drives one deployment restart to a terminal outcome.
//!
//! The monitor issues the restart mutation, then polls the cluster on a
//! fixed cadence and feeds each fresh snapshot through a pure transition
//! function until the rollout completes, fails, or the deadline expires.
//!
//! # Components
//!
//! - **`progress`** — `RolloutState` and the poll-order transition function,
//!   plus the per-pod restart tracker that detects crash loops
//! - **`monitor`** — `RolloutMonitor`: restart side effect, polling loop,
//!   stale-read discard, bounded fetch retries

pub mod monitor;
pub mod progress;

pub use monitor::{RolloutMonitor, RolloutResult};
pub use progress::{FailureReason, PollObservation, RestartTracker, RolloutState};
