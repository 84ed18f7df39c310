//! Pod reconciliation controller
//!
//! The webhook only sees Pods at admission time. The controller re-syncs
//! running Pods so enrichment still converges when the webhook was down,
//! misconfigured, or installed after the workload - and propagates product
//! metadata from the owning Argo CD Application onto the Pod.

mod pod;

pub use pod::{error_policy, reconcile, Context};

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};
use tracing::{debug, error, info};

use crate::cluster::KubeClusterClient;
use crate::config::EnrichmentConfig;
use crate::tracking::TrackingExtractor;

/// Run the Pod controller until shutdown
pub async fn run(client: Client, config: EnrichmentConfig) -> anyhow::Result<()> {
    let pods: Api<Pod> = Api::all(client.clone());

    let extractor = TrackingExtractor::new(config.tracking_label.clone());
    let ctx = Arc::new(Context {
        cluster: Arc::new(KubeClusterClient::new(client.clone())),
        client,
        config,
        extractor,
    });

    info!("starting pod controller");
    Controller::new(pods, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(obj) => debug!(?obj, "pod reconciliation completed"),
                Err(e) => error!(error = ?e, "pod reconciliation error"),
            }
        })
        .await;

    info!("pod controller shutting down");
    Ok(())
}
