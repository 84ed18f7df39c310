//! argo-enrich - labels Pods with the Argo CD application that owns them

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use kube::Client;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use argo_enrich::cluster::KubeClusterClient;
use argo_enrich::config::{EnrichmentConfig, DEFAULT_CONFIGMAP_NAME};
use argo_enrich::tracking::TrackingExtractor;
use argo_enrich::webhook::{self, WebhookState};
use argo_enrich::{controller, DEFAULT_WEBHOOK_PORT};

/// argo-enrich - Argo CD ownership labels for Pods
#[derive(Parser, Debug)]
#[command(name = "argo-enrich", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the mutating admission webhook server
    ///
    /// Serves POST /mutate over HTTPS. Pods admitted through the webhook are
    /// patched with the tracking labels of the Argo CD application owning
    /// their topmost controller.
    Webhook(WebhookArgs),

    /// Run the reconciliation controller
    ///
    /// Watches Pods and converges their tracking labels out of band, for
    /// workloads admitted while the webhook was unavailable, and propagates
    /// product metadata from the owning Application.
    Controller(ControllerArgs),
}

/// Webhook mode arguments
#[derive(Args, Debug)]
struct WebhookArgs {
    /// Certificate for TLS
    #[arg(long, default_value = "/certs/tls.crt")]
    tls_cert: PathBuf,

    /// Private key file for TLS
    #[arg(long, default_value = "/certs/tls.key")]
    tls_key: PathBuf,

    /// Port to listen on for HTTPS traffic
    #[arg(long, default_value_t = DEFAULT_WEBHOOK_PORT)]
    port: u16,

    #[command(flatten)]
    config: ConfigArgs,
}

/// Controller mode arguments
#[derive(Args, Debug)]
struct ControllerArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

/// Where the runtime options ConfigMap lives
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Name of the ConfigMap holding runtime options
    #[arg(long, default_value = DEFAULT_CONFIGMAP_NAME)]
    configmap_name: String,

    /// Namespace of the ConfigMap, normally the operator's own namespace
    #[arg(long, env = "NAMESPACE", default_value = "default")]
    configmap_namespace: String,
}

impl ConfigArgs {
    async fn load(&self, client: &Client) -> EnrichmentConfig {
        EnrichmentConfig::load(client, &self.configmap_namespace, &self.configmap_name).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("failed to install rustls crypto provider: {e:?}");
        std::process::exit(1);
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Webhook(args) => run_webhook(args).await,
        Commands::Controller(args) => run_controller(args).await,
    }
}

/// Run the webhook server until the process is terminated
async fn run_webhook(args: WebhookArgs) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create Kubernetes client: {e}"))?;

    let config = args.config.load(&client).await;
    let state = Arc::new(WebhookState::new(
        Arc::new(KubeClusterClient::new(client)),
        TrackingExtractor::new(config.tracking_label),
    ));

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    webhook::serve(addr, &args.tls_cert, &args.tls_key, state).await
}

/// Run the controller until the process is terminated
async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create Kubernetes client: {e}"))?;

    let config = args.config.load(&client).await;
    controller::run(client, config).await
}
