//! Utils is shared functions and constants for building manifests
use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Capabilities, ConfigMap, EnvVar, EnvVarSource, PersistentVolumeClaim,
            PersistentVolumeClaimSpec, PodSpec, PodTemplateSpec, SeccompProfile,
            SecretKeySelector, SecurityContext, Service, ServicePort, ServiceSpec,
        },
    },
    apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
};
use kube::core::ObjectMeta;

use crate::labels::{app_labels, managed_labels, selector_labels};

/// Shared settings for every manifest of a chart.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Namespace to place manifests in, if any.
    pub namespace: Option<String>,
}

impl Context {
    /// Create a new context.
    pub fn new(namespace: Option<String>) -> Self {
        Self { namespace }
    }

    /// Metadata with the managed labels.
    pub fn meta(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_owned()),
            namespace: self.namespace.clone(),
            labels: managed_labels(),
            ..ObjectMeta::default()
        }
    }

    /// Metadata with the managed labels and the selector labels of `app`.
    pub fn app_meta(&self, name: &str, app: &str) -> ObjectMeta {
        ObjectMeta {
            labels: app_labels(app),
            ..self.meta(name)
        }
    }

    /// Construct a ConfigMap
    pub fn config_map(&self, name: &str, data: BTreeMap<String, String>) -> ConfigMap {
        ConfigMap {
            metadata: self.meta(name),
            data: Some(data),
            ..Default::default()
        }
    }

    /// Construct a single pod Deployment for `app` running `pod`.
    pub fn deployment(&self, name: &str, app: &str, pod: PodSpec) -> Deployment {
        Deployment {
            metadata: self.app_meta(name, app),
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector {
                    match_labels: selector_labels(app),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: app_labels(app),
                        ..Default::default()
                    }),
                    spec: Some(pod),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Construct a ClusterIP Service exposing `port` of `app` under a port named "http".
    pub fn service(&self, name: &str, app: &str, port: i32) -> Service {
        Service {
            metadata: self.app_meta(name, app),
            spec: Some(ServiceSpec {
                ports: Some(vec![ServicePort {
                    name: Some("http".to_owned()),
                    port,
                    protocol: Some("TCP".to_owned()),
                    target_port: Some(IntOrString::Int(port)),
                    ..Default::default()
                }]),
                selector: selector_labels(app),
                type_: Some("ClusterIP".to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Construct a PersistentVolumeClaim
    pub fn persistent_volume_claim(
        &self,
        name: &str,
        spec: PersistentVolumeClaimSpec,
    ) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: self.meta(name),
            spec: Some(spec),
            ..Default::default()
        }
    }
}

/// Env var with a literal value.
pub fn env_value(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.into()),
        ..Default::default()
    }
}

/// Env var read from a key of a secret.
pub fn env_secret(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                key: key.to_owned(),
                name: secret.to_owned(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// Construct a restricted SecurityContext for containers that need no privileges.
pub fn restricted_security_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        run_as_non_root: Some(true),
        capabilities: Some(Capabilities {
            drop: Some(vec!["ALL".to_owned()]),
            ..Default::default()
        }),
        seccomp_profile: Some(SeccompProfile {
            type_: "RuntimeDefault".to_owned(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
