//! ConfigMap-backed runtime options
//!
//! Both run modes read a small set of string options from a ConfigMap at
//! startup. A missing ConfigMap or missing keys fall back to defaults so a
//! bare install works without any configuration object.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use tracing::{info, warn};

/// Default name of the ConfigMap holding the options
pub const DEFAULT_CONFIGMAP_NAME: &str = "argo-enrich-config";

/// ConfigMap key overriding the tracking label the extractor consults
const TRACKING_LABEL_KEY: &str = "trackingLabel";

/// ConfigMap key naming the namespace Argo CD Applications live in
const ARGOCD_NAMESPACE_KEY: &str = "argocdNamespace";

/// Runtime options for the enrichment engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichmentConfig {
    /// Label key to read the application name from when a resource carries
    /// no tracking annotation; `None` uses the Argo CD default label
    pub tracking_label: Option<String>,
    /// Namespace Applications are fetched from when a resource's tracking
    /// metadata does not name one
    pub argocd_namespace: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            tracking_label: None,
            argocd_namespace: "argocd".to_string(),
        }
    }
}

impl EnrichmentConfig {
    /// Build a config from ConfigMap data, defaulting absent or empty keys
    pub fn from_data(data: &BTreeMap<String, String>) -> Self {
        let mut config = Self::default();
        if let Some(label) = data.get(TRACKING_LABEL_KEY) {
            if !label.is_empty() {
                config.tracking_label = Some(label.clone());
            }
        }
        if let Some(namespace) = data.get(ARGOCD_NAMESPACE_KEY) {
            if !namespace.is_empty() {
                config.argocd_namespace = namespace.clone();
            }
        }
        config
    }

    /// Load the config from a ConfigMap, falling back to defaults
    ///
    /// A missing ConfigMap is expected on fresh installs and only logged; an
    /// API failure is logged as a warning. Neither aborts startup.
    pub async fn load(client: &Client, namespace: &str, name: &str) -> Self {
        let api: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
        match api.get_opt(name).await {
            Ok(Some(cm)) => {
                let config = Self::from_data(&cm.data.unwrap_or_default());
                info!(configmap = %name, ?config, "loaded configuration");
                config
            }
            Ok(None) => {
                info!(configmap = %name, "configmap not found, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(configmap = %name, error = %e, "failed to read configmap, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_with_no_data() {
        let config = EnrichmentConfig::from_data(&BTreeMap::new());
        assert_eq!(config, EnrichmentConfig::default());
        assert_eq!(config.argocd_namespace, "argocd");
        assert!(config.tracking_label.is_none());
    }

    #[test]
    fn keys_override_defaults() {
        let config = EnrichmentConfig::from_data(&data(&[
            ("trackingLabel", "team.example.com/app"),
            ("argocdNamespace", "gitops"),
        ]));
        assert_eq!(config.tracking_label.as_deref(), Some("team.example.com/app"));
        assert_eq!(config.argocd_namespace, "gitops");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config =
            EnrichmentConfig::from_data(&data(&[("trackingLabel", ""), ("argocdNamespace", "")]));
        assert_eq!(config, EnrichmentConfig::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = EnrichmentConfig::from_data(&data(&[("somethingElse", "value")]));
        assert_eq!(config, EnrichmentConfig::default());
    }
}
