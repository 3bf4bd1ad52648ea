//! Provides types and functions that are common to the lemmy-k8s chart and its tooling.
#![deny(missing_docs)]
pub mod container_sizes;
#[cfg(feature = "telemetry")]
pub mod telemetry;
