//! rudder-core — shared foundation for the rudder toolkit.
//!
//! Holds the typed snapshot data model (deployments, pods, conditions),
//! the `ClusterGateway` contract that the kube adapter implements, the
//! operation error taxonomy with its exit-code mapping, and the optional
//! `rudder.toml` configuration loader.
//!
//! Raw cluster API objects never leave the gateway boundary: everything
//! the rollout monitor and diagnostic engine consume is an immutable,
//! point-in-time snapshot from this crate.

pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

pub use config::RudderConfig;
pub use error::{OpsError, OpsResult};
pub use gateway::{ClusterGateway, GatewayError, GatewayResult, LogOptions, resolve_deployment};
pub use types::*;
