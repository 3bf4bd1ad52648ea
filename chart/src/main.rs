//! Renders the manifests of a Lemmy instance from a values file.
#![deny(missing_docs)]

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lemmy_chart::{labels::MANAGED_BY_LABEL_SELECTOR, LemmyChart, LemmyProps};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the values file
    #[arg(long, env = "LEMMY_VALUES")]
    values: PathBuf,

    /// Write the manifests to this file instead of stdout
    #[arg(long, env = "LEMMY_OUTPUT")]
    output: Option<PathBuf>,

    /// Namespace of the manifests, overrides the namespace of the values file
    #[arg(long, env = "LEMMY_NAMESPACE")]
    namespace: Option<String>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    lemmy_k8s_common::telemetry::init()?;

    info!(?args.values, ?args.output, "rendering chart");
    let raw = fs::read_to_string(&args.values)
        .with_context(|| format!("reading values from {}", args.values.display()))?;
    let mut props: LemmyProps = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing values from {}", args.values.display()))?;
    if args.namespace.is_some() {
        props.namespace = args.namespace;
    }

    let manifests = LemmyChart::new(props)?.synth()?;
    match &args.output {
        Some(path) => fs::write(path, manifests)
            .with_context(|| format!("writing manifests to {}", path.display()))?,
        None => print!("{manifests}"),
    }
    info!(
        selector = MANAGED_BY_LABEL_SELECTOR,
        "apply with kubectl apply --prune -l <selector> to remove stale resources"
    );
    Ok(())
}
