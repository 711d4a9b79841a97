//! rudder-diagnostic — turns raw snapshots into a health verdict.
//!
//! Purely observational: the engine fetches one deployment snapshot
//! (and optionally its pods), evaluates a fixed rule set, and combines
//! the findings into a single `DiagnosticReport`. No cluster state is
//! mutated.
//!
//! # Components
//!
//! - **`report`** — `DiagnosticReport`, verdicts, and pod reason codes
//! - **`engine`** — rule evaluation and severity combination

pub mod engine;
pub mod report;

pub use engine::DiagnosticEngine;
pub use report::{DiagnosticReport, PodReason, UnhealthyPod, Verdict};
