//! Discovery and dynamic-fetch seam over the Kubernetes API
//!
//! The resolution engine only needs two capabilities from the cluster:
//! enumerating the resource kinds registered under a group/version, and
//! fetching an arbitrary object by resolved handle. Both are behind the
//! [`ClusterClient`] trait so the owner walk can be exercised in tests
//! without a live API server.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject};
use kube::core::GroupVersion;
use kube::discovery::{self, ApiResource, Scope};
use kube::Client;

#[cfg(test)]
use mockall::automock;

use crate::resolve::ResourceHandle;
use crate::{Error, Result};

/// One resource kind as reported by API discovery
///
/// Subresources (e.g. `pods/status`) appear with a `/` in their plural name
/// and are filtered out by the resolver, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Kind name, e.g. `Deployment`
    pub kind: String,
    /// Plural resource name, e.g. `deployments`
    pub plural: String,
    /// Whether objects of this kind live in a namespace
    pub namespaced: bool,
}

/// Trait abstracting the Kubernetes API operations the resolution engine uses
///
/// This trait allows mocking the API server in tests while using the real
/// client in production. Neither method caches: every call is a live round
/// trip, so results track CRD installs/removals without invalidation logic.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List the resource descriptors registered under a group/version
    ///
    /// Fails with [`Error::DiscoveryUnavailable`] when the discovery query
    /// itself errors; an empty list is a valid answer.
    async fn group_version_descriptors(
        &self,
        group_version: &GroupVersion,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// Fetch a single object by resolved handle and name
    ///
    /// `namespace` must be `Some` for namespaced kinds and `None` for
    /// cluster-scoped ones. A 404 maps to [`Error::ResourceNotFound`].
    async fn get_resource(
        &self,
        handle: &ResourceHandle,
        namespace: Option<String>,
        name: &str,
    ) -> Result<DynamicObject>;
}

/// [`ClusterClient`] backed by a real `kube::Client`
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Create a new cluster client wrapping the given Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn group_version_descriptors(
        &self,
        group_version: &GroupVersion,
    ) -> Result<Vec<ResourceDescriptor>> {
        let group = discovery::oneshot::pinned_group(&self.client, group_version)
            .await
            .map_err(Error::DiscoveryUnavailable)?;

        let descriptors = group
            .versioned_resources(&group_version.version)
            .into_iter()
            .map(|(resource, capabilities)| ResourceDescriptor {
                kind: resource.kind,
                plural: resource.plural,
                namespaced: matches!(capabilities.scope, Scope::Namespaced),
            })
            .collect();

        Ok(descriptors)
    }

    async fn get_resource(
        &self,
        handle: &ResourceHandle,
        namespace: Option<String>,
        name: &str,
    ) -> Result<DynamicObject> {
        let resource = ApiResource {
            group: handle.group.clone(),
            version: handle.version.clone(),
            api_version: handle.api_version(),
            kind: handle.kind.clone(),
            plural: handle.plural.clone(),
        };

        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), &ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };

        match api.get(name).await {
            Ok(obj) => Ok(obj),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                Err(Error::resource_not_found(&handle.kind, name))
            }
            Err(e) => Err(Error::Kube(e)),
        }
    }
}
