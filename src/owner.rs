//! Owner-reference chain walking
//!
//! A resource's controller owner is the single owner reference flagged
//! `controller: true`. Following that reference repeatedly leads to the
//! topmost resource under controller ownership - for a Pod, typically the
//! Deployment or CronJob a GitOps tool deployed. Each hop is a live API
//! fetch: the chain is not a caller-owned data structure, so the walk is an
//! explicit loop with a depth ceiling rather than unbounded recursion.

use kube::api::DynamicObject;
use tracing::debug;

use crate::cluster::ClusterClient;
use crate::resolve;
use crate::{Error, Result};

/// Maximum number of ownership hops before the walk gives up
///
/// Real chains are two or three hops deep (Pod -> ReplicaSet -> Deployment).
/// The ceiling only exists to turn a malformed ownership cycle into an error
/// instead of an unbounded sequence of API calls.
pub const MAX_OWNER_DEPTH: usize = 100;

/// Walk a resource's controller-owner chain to its topmost owner
///
/// Scans owner references in order and follows the first one flagged as the
/// controller. Namespaced owners are fetched from the current resource's
/// namespace - owner references carry no namespace of their own, and a
/// controller owner is same-namespace by convention unless cluster-scoped.
/// A resource with no controller owner is returned unchanged.
///
/// Any resolution or fetch failure aborts the walk and surfaces to the
/// caller; there is no partial result and no internal retry. Exceeding
/// [`MAX_OWNER_DEPTH`] fails with [`Error::OwnershipCycleSuspected`].
pub async fn find_topmost_controller_owner(
    client: &dyn ClusterClient,
    resource: DynamicObject,
) -> Result<DynamicObject> {
    let mut current = resource;

    for _ in 0..MAX_OWNER_DEPTH {
        let controller_ref = current
            .metadata
            .owner_references
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|r| r.controller == Some(true))
            .cloned();

        let Some(owner_ref) = controller_ref else {
            return Ok(current);
        };

        debug!(
            owner.kind = %owner_ref.kind,
            owner.name = %owner_ref.name,
            "following controller owner reference"
        );

        let (handle, namespaced) =
            resolve::resolve(client, &owner_ref.api_version, &owner_ref.kind).await?;

        let namespace = if namespaced {
            current.metadata.namespace.clone()
        } else {
            None
        };

        current = client
            .get_resource(&handle, namespace, &owner_ref.name)
            .await?;
    }

    Err(Error::OwnershipCycleSuspected {
        depth: MAX_OWNER_DEPTH,
    })
}
