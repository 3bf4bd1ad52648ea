//! Generates the Kubernetes manifests of a self-hosted Lemmy instance.

/// Backend module for the Lemmy server.
pub mod backend;
/// Chart module assembling every manifest.
pub mod chart;
/// Custom resources of the postgres-operator and cert-manager.
pub mod crds;
/// Database module for the Postgres cluster and its backups.
pub mod database;
mod deployment;
mod error;
/// Labels module for managing resource labels.
pub mod labels;
/// Networking module for the certificate and ingress.
pub mod networking;
/// Nginx module for the internal reverse proxy.
pub mod nginx;
/// Pictrs module for the image server.
pub mod pictrs;
/// Resources module for container requests and limits.
pub mod resources;
pub mod spec;
/// Storage module for persistent volumes.
pub mod storage;
/// UI module for the Lemmy web frontend.
pub mod ui;
/// Utils module for shared utility functions.
pub mod utils;

pub use chart::{LemmyChart, Manifest};
pub use error::{Error, Result};
pub use spec::LemmyProps;

/// Value of the managed-by label on every manifest.
pub const MANAGER_NAME: &str = "lemmy-k8s";

/// RUST_LOG of the backend and pict-rs unless set in the values.
const DEFAULT_RUST_LOG: &str = "warn";
