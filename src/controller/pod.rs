//! Pod reconciliation logic
//!
//! Each pass computes the labels the Pod should carry - the tracking labels
//! derived from its topmost controller owner, plus the product label copied
//! from the owning Argo CD Application - and issues one update when the
//! computed set differs from what is on the Pod.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{DynamicObject, PostParams};
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, warn};

use crate::cluster::ClusterClient;
use crate::config::EnrichmentConfig;
use crate::enrich::{APPLICATION_LABEL, APPLICATION_NAMESPACE_LABEL, INSTALLATION_ID_LABEL};
use crate::owner::find_topmost_controller_owner;
use crate::resolve::ResourceHandle;
use crate::tracking::{TrackingExtractor, TrackingInfo};
use crate::Error;

/// Annotation on an Argo CD Application naming the product it belongs to
pub const PRODUCT_ANNOTATION: &str = "codefresh.io/product";

/// Label stamped on Pods with the owning Application's product
pub const PRODUCT_LABEL: &str = "codefresh.io/product";

/// How often an unchanged Pod is re-examined
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Shared state for the Pod reconciler
pub struct Context {
    /// Client used for the Pod update itself
    pub client: Client,
    /// Cluster access for owner resolution and Application lookup
    pub cluster: Arc<dyn ClusterClient>,
    /// Runtime options
    pub config: EnrichmentConfig,
    /// Extractor configured with the effective tracking label
    pub extractor: TrackingExtractor,
}

/// Reconcile a single Pod
pub async fn reconcile(pod: Arc<Pod>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = pod.name_any();
    let namespace = pod.namespace().unwrap_or_default();

    if pod.metadata.deletion_timestamp.is_some() {
        debug!(pod = %name, "pod is being deleted, skipping");
        return Ok(Action::await_change());
    }

    // The walker and extractor operate on dynamically-typed resources
    let obj: DynamicObject =
        serde_json::to_value(&*pod).and_then(serde_json::from_value)?;
    let owner = find_topmost_controller_owner(ctx.cluster.as_ref(), obj).await?;
    let tracking = ctx.extractor.extract(&owner);

    let mut desired = pod.labels().clone();
    apply_tracking_labels(&mut desired, tracking.as_ref());

    if let Some(product) = lookup_product(&ctx, &desired).await {
        desired.insert(PRODUCT_LABEL.to_string(), product);
    }

    if desired != *pod.labels() {
        info!(pod = %name, namespace = %namespace, "updating pod labels");
        let mut updated = (*pod).clone();
        updated.metadata.labels = Some(desired);
        updated.metadata.managed_fields = None;

        let api: Api<Pod> = Api::namespaced(ctx.client.clone(), &namespace);
        api.replace(&name, &PostParams::default(), &updated).await?;
    }

    Ok(Action::requeue(RESYNC_INTERVAL))
}

/// Requeue failed Pods with a short backoff
///
/// Resolution and fetch errors are soft here: the next pass retries from
/// scratch, and a persistently failing Pod only costs one lookup per
/// requeue.
pub fn error_policy(pod: Arc<Pod>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(pod = %pod.name_any(), error = %error, "reconciliation failed, requeueing");
    Action::requeue(Duration::from_secs(5))
}

/// Merge the tracking labels into the desired label set
fn apply_tracking_labels(labels: &mut BTreeMap<String, String>, tracking: Option<&TrackingInfo>) {
    let Some(info) = tracking else { return };

    labels.insert(APPLICATION_LABEL.to_string(), info.application_name.clone());
    if !info.application_namespace.is_empty() {
        labels.insert(
            APPLICATION_NAMESPACE_LABEL.to_string(),
            info.application_namespace.clone(),
        );
    }
    if !info.installation_id.is_empty() {
        labels.insert(
            INSTALLATION_ID_LABEL.to_string(),
            info.installation_id.clone(),
        );
    }
}

/// Fetch the owning Application's product annotation, if resolvable
///
/// The Application namespace comes from the namespace label when present,
/// else from configuration. Lookup failures only disable product
/// propagation for this pass; they never fail the reconcile.
async fn lookup_product(ctx: &Context, labels: &BTreeMap<String, String>) -> Option<String> {
    let application = labels.get(APPLICATION_LABEL)?;
    let namespace = labels
        .get(APPLICATION_NAMESPACE_LABEL)
        .filter(|ns| !ns.is_empty())
        .cloned()
        .unwrap_or_else(|| ctx.config.argocd_namespace.clone());

    let result = ctx
        .cluster
        .get_resource(&application_handle(), Some(namespace), application)
        .await;

    match result {
        Ok(app) => app
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(PRODUCT_ANNOTATION))
            .cloned(),
        Err(Error::ResourceNotFound { .. }) => {
            debug!(application = %application, "application not found, skipping product propagation");
            None
        }
        Err(e) => {
            warn!(application = %application, error = %e, "application lookup failed, skipping product propagation");
            None
        }
    }
}

/// Handle for Argo CD Application objects
///
/// Applications are consumed dynamically - this operator defines no types
/// for them - so the handle is fixed rather than discovered.
fn application_handle() -> ResourceHandle {
    ResourceHandle {
        group: "argoproj.io".to_string(),
        version: "v1alpha1".to_string(),
        kind: "Application".to_string(),
        plural: "applications".to_string(),
    }
}
