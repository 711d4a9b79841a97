//! Operation error taxonomy and exit-code mapping.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias for core operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors surfaced by rollout and diagnostic operations.
///
/// Every terminal outcome is a distinct variant so callers can map it
/// without string-matching messages. A timed-out rollout is not an
/// error — it is a terminal `RolloutState` carried in the result.
#[derive(Debug, Clone, Error)]
pub enum OpsError {
    /// Target deployment or pod does not exist. Never retried.
    #[error("deployment not found: {0}")]
    NotFound(String),

    /// A name without a namespace matched more than one deployment.
    #[error("multiple deployments named '{name}'; pass --namespace to disambiguate")]
    AmbiguousTarget { name: String },

    /// Malformed reference or non-positive timeout/interval. Rejected
    /// before any cluster call is made.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Cluster reads/writes kept failing past the retry bound.
    #[error("cluster gateway unavailable: {0}")]
    GatewayUnavailable(String),
}

impl OpsError {
    /// Process exit code for this error class.
    ///
    /// 1 for not-found/validation, 3 for gateway unavailability.
    /// (0 is success and 2 is reserved for a timed-out rollout.)
    pub fn exit_code(&self) -> u8 {
        match self {
            OpsError::NotFound(_) | OpsError::AmbiguousTarget { .. } | OpsError::Validation(_) => 1,
            OpsError::GatewayUnavailable(_) => 3,
        }
    }
}

impl From<GatewayError> for OpsError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(what) => OpsError::NotFound(what),
            GatewayError::Unavailable(why) => OpsError::GatewayUnavailable(why),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_convention() {
        assert_eq!(OpsError::NotFound("prod/api".into()).exit_code(), 1);
        assert_eq!(
            OpsError::AmbiguousTarget { name: "api".into() }.exit_code(),
            1
        );
        assert_eq!(OpsError::Validation("bad".into()).exit_code(), 1);
        assert_eq!(
            OpsError::GatewayUnavailable("refused".into()).exit_code(),
            3
        );
    }

    #[test]
    fn gateway_errors_map_onto_taxonomy() {
        let err: OpsError = GatewayError::NotFound("prod/api".into()).into();
        assert!(matches!(err, OpsError::NotFound(_)));

        let err: OpsError = GatewayError::Unavailable("timeout".into()).into();
        assert!(matches!(err, OpsError::GatewayUnavailable(_)));
    }
}
