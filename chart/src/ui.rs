//! Lemmy UI Deployment and Service.
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Container, ContainerPort, PodSpec, Service},
};
use lemmy_k8s_common::container_sizes::ServiceKind;

use crate::{
    backend::{BACKEND_PORT, BACKEND_SERVICE_NAME},
    resources::ResourceConfig,
    spec::{DeploymentValues, LemmyProps},
    utils::{env_value, Context},
};

pub const UI_APP: &str = "lemmy-ui";
pub const UI_SERVICE_NAME: &str = "lemmy-ui";
pub const UI_PORT: i32 = 1234;
pub const UI_IMAGE: &str = "dessalines/lemmy-ui:0.18.5";

pub struct UiConfig {
    pub hostname: String,
    pub values: DeploymentValues,
}

impl UiConfig {
    pub fn from_props(props: &LemmyProps) -> Self {
        Self {
            hostname: props.hostname.clone(),
            values: props.lemmy_ui_pod.clone().unwrap_or_default(),
        }
    }

    pub fn deployment(&self, cx: &Context) -> Deployment {
        let deployment = cx.deployment(
            UI_APP,
            UI_APP,
            PodSpec {
                containers: vec![Container {
                    name: "lemmy-ui".to_owned(),
                    image: Some(UI_IMAGE.to_owned()),
                    ports: Some(vec![ContainerPort {
                        container_port: UI_PORT,
                        name: Some("http".to_owned()),
                        ..Default::default()
                    }]),
                    env: Some(vec![
                        env_value(
                            "LEMMY_UI_LEMMY_INTERNAL_HOST",
                            format!("{BACKEND_SERVICE_NAME}:{BACKEND_PORT}"),
                        ),
                        env_value("LEMMY_UI_LEMMY_EXTERNAL_HOST", self.hostname.clone()),
                        env_value("LEMMY_UI_HTTPS", "true"),
                    ]),
                    resources: Some(ResourceConfig::from_setting(None, ServiceKind::Ui).into()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        self.values.apply_to_deployment(ServiceKind::Ui, deployment)
    }

    pub fn service(&self, cx: &Context) -> Service {
        cx.service(UI_SERVICE_NAME, UI_APP, UI_PORT)
    }
}

#[cfg(test)]
mod tests {
    use lemmy_k8s_common::container_sizes::{ContainerSize, ResourceSetting};
    use serde_json::json;

    use super::*;

    fn config() -> UiConfig {
        UiConfig {
            hostname: "lemmy.example.com".to_owned(),
            values: DeploymentValues::default(),
        }
    }

    #[test]
    fn default_deployment() {
        let deployment =
            serde_json::to_value(config().deployment(&Context::new(Some("lemmy".to_owned()))))
                .unwrap();
        assert_eq!(
            deployment,
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {
                    "name": "lemmy-ui",
                    "namespace": "lemmy",
                    "labels": { "app": "lemmy-ui", "managed-by": "lemmy-k8s" },
                },
                "spec": {
                    "replicas": 1,
                    "selector": { "matchLabels": { "app": "lemmy-ui" } },
                    "template": {
                        "metadata": {
                            "labels": { "app": "lemmy-ui", "managed-by": "lemmy-k8s" },
                        },
                        "spec": {
                            "containers": [{
                                "name": "lemmy-ui",
                                "image": "dessalines/lemmy-ui:0.18.5",
                                "ports": [{ "containerPort": 1234, "name": "http" }],
                                "env": [
                                    {
                                        "name": "LEMMY_UI_LEMMY_INTERNAL_HOST",
                                        "value": "lemmy-backend:8536",
                                    },
                                    {
                                        "name": "LEMMY_UI_LEMMY_EXTERNAL_HOST",
                                        "value": "lemmy.example.com",
                                    },
                                    { "name": "LEMMY_UI_HTTPS", "value": "true" },
                                ],
                                "resources": {
                                    "requests": { "cpu": "10m" },
                                    "limits": { "memory": "200Mi" },
                                },
                            }],
                        },
                    },
                },
            })
        );
    }

    #[test]
    fn values_override_defaults() {
        let config = UiConfig {
            values: DeploymentValues {
                image: Some("dessalines/lemmy-ui:0.19.0".to_owned()),
                container_size: Some(ResourceSetting::Preset(ContainerSize::Xlarge)),
                replicas: Some(3),
                ..Default::default()
            },
            ..config()
        };
        let deployment = serde_json::to_value(config.deployment(&Context::default())).unwrap();
        let container = &deployment["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(deployment["spec"]["replicas"], json!(3));
        assert_eq!(container["image"], json!("dessalines/lemmy-ui:0.19.0"));
        assert_eq!(
            container["resources"],
            json!({
                "requests": { "cpu": "2" },
                "limits": { "memory": "4096Mi" },
            })
        );
    }

    #[test]
    fn service_targets_ui_port() {
        let service = serde_json::to_value(config().service(&Context::default())).unwrap();
        assert_eq!(service["metadata"]["name"], json!("lemmy-ui"));
        assert_eq!(service["spec"]["ports"][0]["port"], json!(1234));
        assert_eq!(service["spec"]["selector"], json!({ "app": "lemmy-ui" }));
    }
}
