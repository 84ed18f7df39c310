//! argo-enrich - Kubernetes operator that labels Pods with their Argo CD owner
//!
//! Pods created by a GitOps-managed workload carry no direct record of the
//! Argo CD application that produced them: the tracking metadata lives on the
//! topmost workload resource (Deployment, Rollout, CronJob, ...), several
//! ownership hops above the Pod. argo-enrich closes that gap by walking a
//! Pod's owner-reference chain to its topmost controller owner, reading the
//! Argo CD tracking metadata found there, and stamping the result back onto
//! the Pod as labels.
//!
//! # Architecture
//!
//! The same resolution engine backs two delivery paths:
//! - A mutating admission webhook that patches Pods at creation time
//!   (JSON Patch embedded in the admission response)
//! - A reconciliation controller that re-syncs running Pods the webhook
//!   missed and propagates product metadata from the owning Application
//!
//! # Modules
//!
//! - [`cluster`] - Discovery and dynamic-fetch seam over the Kubernetes API
//! - [`resolve`] - (apiVersion, kind) to resource-handle resolution
//! - [`owner`] - Owner-reference chain walking
//! - [`tracking`] - Argo CD tracking metadata extraction
//! - [`enrich`] - JSON Patch construction for the enrichment labels
//! - [`webhook`] - Mutating admission webhook server
//! - [`controller`] - Pod reconciliation controller
//! - [`config`] - ConfigMap-backed runtime options
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod cluster;
pub mod config;
pub mod controller;
pub mod enrich;
pub mod error;
pub mod owner;
pub mod resolve;
pub mod tracking;
pub mod webhook;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default port for the webhook HTTPS server
///
/// Port 8443 is used instead of 443 to avoid requiring root privileges;
/// the in-cluster Service maps 443 to this port.
pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;
