//! Mutating admission webhook for Pod enrichment
//!
//! Intercepts Pod CREATE requests, resolves the Pod's topmost controller
//! owner, and patches the Argo CD tracking labels onto the Pod before it is
//! persisted. The webhook never rejects a request: enrichment failures are
//! logged and the Pod is admitted unchanged, so a broken resolution path
//! cannot block unrelated cluster operations.

pub mod pod;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::cluster::ClusterClient;
use crate::tracking::TrackingExtractor;

/// Shared state for webhook handlers
pub struct WebhookState {
    /// Cluster access for owner resolution
    pub cluster: Arc<dyn ClusterClient>,
    /// Extractor configured with the effective tracking label
    pub extractor: TrackingExtractor,
}

impl WebhookState {
    /// Create webhook state from a cluster client and extractor
    pub fn new(cluster: Arc<dyn ClusterClient>, extractor: TrackingExtractor) -> Self {
        Self { cluster, extractor }
    }
}

/// Create the webhook router
///
/// Currently a single endpoint:
/// - POST /mutate - Mutate Pods with Argo CD tracking labels
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(pod::mutate_handler))
        .with_state(state)
}

/// Serve the webhook over HTTPS until the process exits
///
/// The certificate and key are mounted files (typically a cert-manager or
/// webhook-cert secret); they are read once at startup.
pub async fn serve(
    addr: SocketAddr,
    tls_cert: &Path,
    tls_key: &Path,
    state: Arc<WebhookState>,
) -> anyhow::Result<()> {
    let tls_config = RustlsConfig::from_pem_file(tls_cert, tls_key).await?;

    info!(%addr, "starting webhook HTTPS server");
    axum_server::bind_rustls(addr, tls_config)
        .serve(webhook_router(state).into_make_service())
        .await?;
    Ok(())
}
