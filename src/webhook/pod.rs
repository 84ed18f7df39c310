//! Pod mutation handler
//!
//! Handles AdmissionReview requests for Pods: walks the owner chain of the
//! admitted Pod, extracts the Argo CD tracking identity from the topmost
//! owner, and responds with a JSON Patch stamping the enrichment labels.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use json_patch::{AddOperation, PatchOperation};
use jsonptr::PointerBuf;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tracing::{debug, error, info, warn};

use super::WebhookState;
use crate::enrich::build_enrichment_patch;
use crate::owner::find_topmost_controller_owner;

/// Handle a mutating admission review for Pods
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = mutate_pod(&state, &request).await;
    Json(response.into_review())
}

/// Process a single Pod admission request
///
/// Enrichment failures are soft: the response is always `allowed`, with the
/// patch omitted when the owner walk or extraction cannot complete. Only a
/// request that is not for Pods at all is answered as invalid.
async fn mutate_pod(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    if request.resource.resource != "pods" || !request.resource.group.is_empty() {
        warn!(resource = %request.resource.resource, "admission request is not for pods");
        return AdmissionResponse::invalid(format!(
            "expected a pods admission request, got {}",
            request.resource.resource
        ));
    }

    let Some(object) = &request.object else {
        debug!(uid = %request.uid, "no object in request, allowing unchanged");
        return AdmissionResponse::from(request);
    };

    // Admission objects frequently omit metadata.namespace; the request
    // carries it, and the owner walk needs it to fetch namespaced owners.
    let mut pod = object.clone();
    if pod.metadata.namespace.is_none() {
        pod.metadata.namespace = request.namespace.clone();
    }

    let owner = match find_topmost_controller_owner(state.cluster.as_ref(), pod).await {
        Ok(owner) => owner,
        Err(e) => {
            warn!(
                uid = %request.uid,
                error = %e,
                "owner resolution failed, allowing pod unchanged"
            );
            return AdmissionResponse::from(request);
        }
    };

    let Some(info) = state.extractor.extract(&owner) else {
        debug!(
            uid = %request.uid,
            owner.kind = ?owner.types.as_ref().map(|t| t.kind.as_str()),
            owner.name = ?owner.metadata.name,
            "topmost owner carries no tracking metadata, allowing pod unchanged"
        );
        return AdmissionResponse::from(request);
    };

    info!(
        uid = %request.uid,
        application = %info.application_name,
        "enriching pod with tracking labels"
    );

    // `add` needs its parent to exist, and Pods without any labels are
    // admitted with no labels map at all.
    let mut ops = Vec::new();
    if object.metadata.labels.is_none() {
        ops.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["metadata", "labels"]),
            value: serde_json::json!({}),
        }));
    }
    ops.extend(build_enrichment_patch(&info));

    match AdmissionResponse::from(request).with_patch(json_patch::Patch(ops)) {
        Ok(response) => response,
        Err(e) => {
            error!(uid = %request.uid, error = %e, "failed to serialize patch, allowing pod unchanged");
            AdmissionResponse::from(request)
        }
    }
}
