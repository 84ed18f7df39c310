//! JSON Patch construction for the enrichment labels
//!
//! An extracted [`TrackingInfo`] becomes an ordered list of JSON Patch `add`
//! operations against the target's `metadata.labels`. Label keys are
//! domain-prefixed and therefore contain `/`, which must appear as `~1` in
//! JSON Pointer paths; the pointer type handles that escaping.

use json_patch::{AddOperation, PatchOperation};
use jsonptr::PointerBuf;
use serde_json::Value;

use crate::tracking::TrackingInfo;

/// Label stamped with the owning application's name
pub const APPLICATION_LABEL: &str = "argocd.argoproj.io/application";

/// Label stamped with the owning application's namespace
pub const APPLICATION_NAMESPACE_LABEL: &str = "argocd.argoproj.io/application-namespace";

/// Label stamped with the Argo CD installation id
pub const INSTALLATION_ID_LABEL: &str = "argocd.argoproj.io/installation-id";

/// Build the label patch for an extracted tracking identity
///
/// Emits `add` operations in a fixed order: application name, then
/// namespace and installation id when non-empty. The paths are
/// non-conflicting so ordering is only observable in the output document,
/// and `add` on an existing key overwrites it, making re-application
/// idempotent.
pub fn build_enrichment_patch(info: &TrackingInfo) -> Vec<PatchOperation> {
    let mut ops = vec![label_add(APPLICATION_LABEL, &info.application_name)];

    if !info.application_namespace.is_empty() {
        ops.push(label_add(
            APPLICATION_NAMESPACE_LABEL,
            &info.application_namespace,
        ));
    }

    if !info.installation_id.is_empty() {
        ops.push(label_add(INSTALLATION_ID_LABEL, &info.installation_id));
    }

    ops
}

/// An `add` of one string label under `/metadata/labels`
fn label_add(key: &str, value: &str) -> PatchOperation {
    PatchOperation::Add(AddOperation {
        path: PointerBuf::from_tokens(["metadata", "labels", key]),
        value: Value::String(value.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, namespace: &str, installation_id: &str) -> TrackingInfo {
        TrackingInfo {
            application_name: name.to_string(),
            application_namespace: namespace.to_string(),
            installation_id: installation_id.to_string(),
        }
    }

    fn paths(ops: &[PatchOperation]) -> Vec<String> {
        ops.iter()
            .map(|op| match op {
                PatchOperation::Add(add) => add.path.to_string(),
                other => panic!("expected add operation, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn name_only_identity_yields_one_add() {
        let ops = build_enrichment_patch(&info("myapp", "", ""));
        assert_eq!(
            paths(&ops),
            vec!["/metadata/labels/argocd.argoproj.io~1application"]
        );
    }

    #[test]
    fn namespace_op_is_emitted_and_escaped() {
        let ops = build_enrichment_patch(&info("myapp", "myns", ""));
        assert_eq!(
            paths(&ops),
            vec![
                "/metadata/labels/argocd.argoproj.io~1application",
                "/metadata/labels/argocd.argoproj.io~1application-namespace",
            ]
        );
    }

    #[test]
    fn full_identity_emits_three_ops_in_order() {
        let ops = build_enrichment_patch(&info("myapp", "myns", "install-1"));
        assert_eq!(
            paths(&ops),
            vec![
                "/metadata/labels/argocd.argoproj.io~1application",
                "/metadata/labels/argocd.argoproj.io~1application-namespace",
                "/metadata/labels/argocd.argoproj.io~1installation-id",
            ]
        );
    }

    #[test]
    fn patch_applies_to_an_empty_labels_document() {
        let ops = build_enrichment_patch(&info("myapp", "myns", "install-1"));
        let mut doc = serde_json::json!({"metadata": {"labels": {}}});
        json_patch::patch(&mut doc, &ops).unwrap();

        assert_eq!(
            doc,
            serde_json::json!({
                "metadata": {
                    "labels": {
                        "argocd.argoproj.io/application": "myapp",
                        "argocd.argoproj.io/application-namespace": "myns",
                        "argocd.argoproj.io/installation-id": "install-1",
                    }
                }
            })
        );

        // Re-applying the same patch leaves the document unchanged
        let before = doc.clone();
        json_patch::patch(&mut doc, &ops).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn serialized_ops_carry_escaped_paths() {
        let ops = build_enrichment_patch(&info("myapp", "myns", ""));
        let raw = serde_json::to_string(&json_patch::Patch(ops)).unwrap();
        assert!(raw.contains(r#""path":"/metadata/labels/argocd.argoproj.io~1application-namespace""#));
        assert!(raw.contains(r#""op":"add""#));
        assert!(!raw.contains("argocd.argoproj.io/application-namespace"));
    }
}
