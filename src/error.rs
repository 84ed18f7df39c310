//! Error types for the argo-enrich operator

use thiserror::Error;

/// Main error type for enrichment operations
///
/// The resolution layer is fail-fast: errors from discovery and owner-chain
/// fetches propagate unchanged to the caller, which decides whether to
/// requeue (controller) or allow the request unpatched (webhook). A resource
/// without tracking metadata is `None`, never an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An apiVersion string did not have the `group/version` or `version` shape
    #[error("malformed apiVersion {0:?}")]
    MalformedVersion(String),

    /// Discovery returned no non-subresource descriptor for the kind
    #[error("kind {kind} not found in {group_version}")]
    KindNotFound {
        /// Kind that was looked up
        kind: String,
        /// Group/version that was queried
        group_version: String,
    },

    /// The discovery query itself failed (network, auth, ...)
    #[error("discovery unavailable: {0}")]
    DiscoveryUnavailable(#[source] kube::Error),

    /// A resource named by an owner reference does not exist
    #[error("{kind} {name:?} not found")]
    ResourceNotFound {
        /// Kind of the missing resource
        kind: String,
        /// Name of the missing resource
        name: String,
    },

    /// The owner chain exceeded the depth ceiling, likely a reference cycle
    #[error("owner chain exceeded {depth} hops, ownership cycle suspected")]
    OwnershipCycleSuspected {
        /// Depth at which the walk gave up
        depth: usize,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed-apiVersion error for the given input
    pub fn malformed_version(api_version: impl Into<String>) -> Self {
        Self::MalformedVersion(api_version.into())
    }

    /// Create a kind-not-found error for the given lookup
    pub fn kind_not_found(kind: impl Into<String>, group_version: impl Into<String>) -> Self {
        Self::KindNotFound {
            kind: kind.into(),
            group_version: group_version.into(),
        }
    }

    /// Create a resource-not-found error for the given resource
    pub fn resource_not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_lookup() {
        let err = Error::malformed_version("apps/v1/extra");
        assert!(err.to_string().contains("apps/v1/extra"));

        let err = Error::kind_not_found("FlimFlam", "apps/v1");
        assert!(err.to_string().contains("FlimFlam"));
        assert!(err.to_string().contains("apps/v1"));

        let err = Error::resource_not_found("ReplicaSet", "web-7d9c");
        assert!(err.to_string().contains("web-7d9c"));
    }

    #[test]
    fn cycle_error_reports_depth() {
        let err = Error::OwnershipCycleSuspected { depth: 100 };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn constructors_accept_str_and_string() {
        let kind = String::from("Deployment");
        match Error::kind_not_found(kind, "apps/v1") {
            Error::KindNotFound { kind, group_version } => {
                assert_eq!(kind, "Deployment");
                assert_eq!(group_version, "apps/v1");
            }
            _ => panic!("expected KindNotFound variant"),
        }
    }
}
