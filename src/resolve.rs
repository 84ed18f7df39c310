//! Resolution of (apiVersion, kind) pairs to queryable resource handles
//!
//! Owner references identify their target only by apiVersion, kind and name.
//! Turning that into something fetchable requires live API discovery: the
//! plural resource name and the namespace scope are properties of the
//! cluster, not of the reference. Resolution is stateless and uncached;
//! repeated lookups of the same pair issue repeated discovery calls.

use kube::core::GroupVersion;

use crate::cluster::{ClusterClient, ResourceDescriptor};
use crate::{Error, Result};

/// Fully-qualified handle for one resource kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    /// API group, empty for the core group
    pub group: String,
    /// API version within the group
    pub version: String,
    /// Kind name
    pub kind: String,
    /// Plural resource name used in request paths
    pub plural: String,
}

impl ResourceHandle {
    /// The `group/version` string (or bare `version` for the core group)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Parse an apiVersion string into its group and version parts
///
/// Accepts the two shapes Kubernetes uses: `group/version` (e.g. `apps/v1`)
/// and bare `version` for the core group (e.g. `v1`). Anything else,
/// including empty segments, is [`Error::MalformedVersion`].
pub fn parse_group_version(api_version: &str) -> Result<GroupVersion> {
    let parts: Vec<&str> = api_version.split('/').collect();
    match parts[..] {
        [version] if !version.is_empty() => Ok(GroupVersion {
            group: String::new(),
            version: version.to_string(),
        }),
        [group, version] if !group.is_empty() && !version.is_empty() => Ok(GroupVersion {
            group: group.to_string(),
            version: version.to_string(),
        }),
        _ => Err(Error::malformed_version(api_version)),
    }
}

/// Resolve an (apiVersion, kind) pair to a resource handle and its scope
///
/// Queries discovery for the exact group/version and scans the returned
/// descriptors for the first whose kind matches and whose plural name names
/// a top-level resource (subresources like `pods/status` carry a `/`).
/// Returns the handle plus whether the kind is namespaced.
pub async fn resolve(
    client: &dyn ClusterClient,
    api_version: &str,
    kind: &str,
) -> Result<(ResourceHandle, bool)> {
    let group_version = parse_group_version(api_version)?;
    let descriptors = client.group_version_descriptors(&group_version).await?;

    let descriptor = select_descriptor(&descriptors, kind)
        .ok_or_else(|| Error::kind_not_found(kind, api_version))?;

    let handle = ResourceHandle {
        group: group_version.group,
        version: group_version.version,
        kind: descriptor.kind.clone(),
        plural: descriptor.plural.clone(),
    };
    Ok((handle, descriptor.namespaced))
}

/// Pick the first descriptor matching the kind, skipping subresources
fn select_descriptor<'a>(
    descriptors: &'a [ResourceDescriptor],
    kind: &str,
) -> Option<&'a ResourceDescriptor> {
    descriptors
        .iter()
        .find(|d| d.kind == kind && !d.plural.contains('/'))
}

#[cfg(test)]
mod tests {
    use mockall::predicate;

    use super::*;
    use crate::cluster::MockClusterClient;

    fn descriptor(kind: &str, plural: &str, namespaced: bool) -> ResourceDescriptor {
        ResourceDescriptor {
            kind: kind.to_string(),
            plural: plural.to_string(),
            namespaced,
        }
    }

    #[test]
    fn parses_grouped_api_version() {
        let gv = parse_group_version("apps/v1").unwrap();
        assert_eq!(gv.group, "apps");
        assert_eq!(gv.version, "v1");
    }

    #[test]
    fn parses_core_api_version() {
        let gv = parse_group_version("v1").unwrap();
        assert_eq!(gv.group, "");
        assert_eq!(gv.version, "v1");
    }

    #[test]
    fn rejects_malformed_api_versions() {
        for input in ["", "/", "apps/", "/v1", "apps/v1/extra"] {
            match parse_group_version(input) {
                Err(Error::MalformedVersion(got)) => assert_eq!(got, input),
                other => panic!("expected MalformedVersion for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn select_skips_subresources() {
        // pods/status precedes pods in the list, as discovery may order it
        let descriptors = vec![
            descriptor("Pod", "pods/status", true),
            descriptor("Pod", "pods", true),
        ];
        let found = select_descriptor(&descriptors, "Pod").unwrap();
        assert_eq!(found.plural, "pods");
    }

    #[test]
    fn select_requires_exact_kind_match() {
        let descriptors = vec![descriptor("PodTemplate", "podtemplates", true)];
        assert!(select_descriptor(&descriptors, "Pod").is_none());
    }

    #[tokio::test]
    async fn resolve_returns_handle_and_scope() {
        let mut client = MockClusterClient::new();
        client
            .expect_group_version_descriptors()
            .with(predicate::function(|gv: &GroupVersion| {
                gv.group == "apps" && gv.version == "v1"
            }))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    descriptor("Deployment", "deployments", true),
                    descriptor("ReplicaSet", "replicasets", true),
                ])
            });

        let (handle, namespaced) = resolve(&client, "apps/v1", "ReplicaSet").await.unwrap();
        assert_eq!(handle.group, "apps");
        assert_eq!(handle.version, "v1");
        assert_eq!(handle.plural, "replicasets");
        assert_eq!(handle.api_version(), "apps/v1");
        assert!(namespaced);
    }

    #[tokio::test]
    async fn resolve_reports_cluster_scope() {
        let mut client = MockClusterClient::new();
        client
            .expect_group_version_descriptors()
            .returning(|_| Ok(vec![descriptor("Node", "nodes", false)]));

        let (handle, namespaced) = resolve(&client, "v1", "Node").await.unwrap();
        assert_eq!(handle.api_version(), "v1");
        assert!(!namespaced);
    }

    #[tokio::test]
    async fn unknown_kind_is_kind_not_found() {
        let mut client = MockClusterClient::new();
        client
            .expect_group_version_descriptors()
            .returning(|_| Ok(vec![descriptor("Deployment", "deployments", true)]));

        let err = resolve(&client, "apps/v1", "FlimFlam").await.unwrap_err();
        match err {
            Error::KindNotFound { kind, group_version } => {
                assert_eq!(kind, "FlimFlam");
                assert_eq!(group_version, "apps/v1");
            }
            other => panic!("expected KindNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_api_version_skips_discovery() {
        // No expectation set: the mock panics if discovery is consulted
        let client = MockClusterClient::new();
        let err = resolve(&client, "apps/v1/extra", "Deployment")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedVersion(_)));
    }
}
