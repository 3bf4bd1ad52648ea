use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentSpec},
    core::v1::{Affinity, Container, PodSpec, PodTemplateSpec},
};
use lemmy_k8s_common::container_sizes::ServiceKind;
use tracing::debug;

use crate::{error::Result, resources::ResourceConfig, spec::DeploymentValues, Error};

impl DeploymentValues {
    /// Reject values the API server would refuse.
    pub fn validate(&self, field: &'static str) -> Result<()> {
        match self.replicas {
            Some(replicas) if replicas < 0 => Err(Error::invalid(
                field,
                format!("replicas must not be negative, got {replicas}"),
            )),
            _ => Ok(()),
        }
    }

    /// Replace the fields of `deployment` that these values set.
    ///
    /// The image and resources apply to the first container of the pod.
    /// `service` selects the preset row when the container size is a preset name.
    pub fn apply_to_deployment(&self, service: ServiceKind, deployment: Deployment) -> Deployment {
        debug!(?service, values = ?self, "applying deployment values");
        Deployment {
            spec: deployment.spec.map(|spec| DeploymentSpec {
                replicas: self.replicas.or(spec.replicas),
                template: self.apply_to_pod_template(service, spec.template),
                ..spec
            }),
            ..deployment
        }
    }

    fn apply_to_pod_template(
        &self,
        service: ServiceKind,
        pod_template: PodTemplateSpec,
    ) -> PodTemplateSpec {
        PodTemplateSpec {
            spec: pod_template.spec.map(|spec| self.apply_to_pod(service, spec)),
            ..pod_template
        }
    }

    fn apply_to_pod(&self, service: ServiceKind, spec: PodSpec) -> PodSpec {
        let mut containers = spec.containers;
        if let Some(first) = containers.first_mut() {
            *first = self.apply_to_container(service, first.clone());
        }
        let affinity = match &self.node_affinity {
            Some(node_affinity) => Some(Affinity {
                node_affinity: Some(node_affinity.clone()),
                ..spec.affinity.unwrap_or_default()
            }),
            None => spec.affinity,
        };
        PodSpec {
            containers,
            affinity,
            node_selector: self.node_selector.clone().or(spec.node_selector),
            tolerations: self.tolerations.clone().or(spec.tolerations),
            ..spec
        }
    }

    fn apply_to_container(&self, service: ServiceKind, container: Container) -> Container {
        Container {
            image: self.image.clone().or(container.image),
            resources: match &self.container_size {
                Some(setting) => {
                    Some(ResourceConfig::from_setting(Some(setting), service).into())
                }
                None => container.resources,
            },
            ..container
        }
    }
}
