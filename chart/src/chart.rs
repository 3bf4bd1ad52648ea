//! Assembles every manifest of a Lemmy instance from its values.
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, PersistentVolumeClaim, Service},
    networking::v1::Ingress,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    backend::BackendConfig,
    crds::{Certificate, Postgresql},
    database::DatabaseConfig,
    error::Result,
    networking::NetworkingConfig,
    nginx,
    pictrs::PictrsConfig,
    spec::LemmyProps,
    ui::UiConfig,
    utils::Context,
    Error,
};

/// Any manifest the chart emits.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Manifest {
    ConfigMap(ConfigMap),
    Deployment(Deployment),
    Service(Service),
    PersistentVolumeClaim(PersistentVolumeClaim),
    Ingress(Ingress),
    Postgresql(Postgresql),
    Certificate(Certificate),
}

macro_rules! impl_from_manifest {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Manifest {
                fn from(value: $kind) -> Self {
                    Manifest::$kind(value)
                }
            }
        )*
    };
}

impl_from_manifest!(
    ConfigMap,
    Deployment,
    Service,
    PersistentVolumeClaim,
    Ingress,
    Postgresql,
    Certificate,
);

/// Validated values of a Lemmy instance.
#[derive(Debug)]
pub struct LemmyChart {
    props: LemmyProps,
}

impl LemmyChart {
    /// Validate `props` and build a chart from them.
    pub fn new(props: LemmyProps) -> Result<Self> {
        if props.hostname.trim().is_empty() {
            return Err(Error::invalid("hostname", "must not be empty"));
        }
        if props.cert_manager_issuer.name.is_empty() {
            return Err(Error::invalid("certManagerIssuer.name", "must not be empty"));
        }
        if props.pictrs_bucket.bucket_name.is_empty() {
            return Err(Error::invalid("pictrsBucket.bucketName", "must not be empty"));
        }
        for (field, values) in [
            ("lemmyBackendPod", &props.lemmy_backend_pod),
            ("lemmyUiPod", &props.lemmy_ui_pod),
            ("pictrsPod", &props.pictrs_pod),
        ] {
            if let Some(values) = values {
                values.validate(field)?;
            }
        }
        DatabaseConfig::from_props(&props.database)?;
        Ok(Self { props })
    }

    /// Every manifest in the order they should be applied.
    pub fn manifests(&self) -> Result<Vec<Manifest>> {
        let cx = Context::new(self.props.namespace.clone());
        let database = DatabaseConfig::from_props(&self.props.database)?;
        let backend = BackendConfig::from_props(&self.props);
        let ui = UiConfig::from_props(&self.props);
        let pictrs = PictrsConfig::from_props(&self.props);
        let networking = NetworkingConfig {
            hostname: self.props.hostname.clone(),
            issuer: self.props.cert_manager_issuer.clone(),
            ingress_class_name: self.props.ingress_class_name.clone(),
        };

        let manifests: Vec<Manifest> = vec![
            database.backup_config_map(&cx).into(),
            database.postgresql(&cx).into(),
            backend.config_map(&cx)?.into(),
            backend.deployment(&cx).into(),
            backend.service(&cx).into(),
            ui.deployment(&cx).into(),
            ui.service(&cx).into(),
            pictrs.persistent_volume_claim(&cx).into(),
            pictrs.deployment(&cx).into(),
            pictrs.service(&cx).into(),
            nginx::config_map(&cx).into(),
            nginx::deployment(&cx).into(),
            nginx::service(&cx).into(),
            networking.certificate(&cx).into(),
            networking.ingress(&cx).into(),
        ];
        debug!(count = manifests.len(), "built manifests");
        Ok(manifests)
    }

    /// Render every manifest as a multi document YAML stream.
    pub fn synth(&self) -> Result<String> {
        let documents = self
            .manifests()?
            .iter()
            .map(serde_yaml::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            hostname = %self.props.hostname,
            documents = documents.len(),
            "synthesized chart"
        );
        Ok(documents.join("---\n"))
    }
}
