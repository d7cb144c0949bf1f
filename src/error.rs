// ============================================================================
// spark-features - Errors
// ============================================================================

use thiserror::Error;

use crate::core::types::ObjectUid;

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Why a component wrapper failed to hand over its native feature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The component went away before it ever resolved
    #[error("component was dropped before resolving")]
    Canceled,

    /// The component resolved to something other than a feature
    #[error("component resolved to a {0}, not a feature")]
    NotAFeature(String),

    /// The component reported its own failure
    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced by the features container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// A component wrapper failed to resolve to a usable native feature
    #[error("failed to resolve feature component: {0}")]
    Resolution(#[from] ResolveError),

    /// Normalization produced something that is not a feature
    #[error("expected a feature, got {found}")]
    Type { found: String },

    /// The feature's event streams could not be subscribed to
    #[error("cannot watch feature {uid}: {reason}")]
    Watch { uid: ObjectUid, reason: String },

    /// Invalid container options
    #[error("invalid container options: {0}")]
    Config(String),
}

impl FeatureError {
    /// Create a type error
    pub fn type_error(found: impl Into<String>) -> Self {
        Self::Type {
            found: found.into(),
        }
    }

    /// Create a watch error
    pub fn watch(uid: ObjectUid, reason: impl Into<String>) -> Self {
        Self::Watch {
            uid,
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_wraps_resolve_error() {
        let err: FeatureError = ResolveError::Canceled.into();
        assert_eq!(
            err.to_string(),
            "failed to resolve feature component: component was dropped before resolving"
        );
    }

    #[test]
    fn type_error_message() {
        let err = FeatureError::type_error("FeatureCollection");
        assert_eq!(err.to_string(), "expected a feature, got FeatureCollection");
    }
}
