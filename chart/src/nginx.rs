//! Internal nginx that splits traffic between the Lemmy backend and UI.
use std::collections::BTreeMap;

use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{
        ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource,
        PodSpec, Service, Volume, VolumeMount,
    },
};
use lemmy_k8s_common::container_sizes::{
    custom_container_resources, mebibytes, CustomContainerSize,
};

use crate::{
    backend::{BACKEND_PORT, BACKEND_SERVICE_NAME},
    resources::ResourceConfig,
    ui::{UI_PORT, UI_SERVICE_NAME},
    utils::{restricted_security_context, Context},
};

pub const NGINX_APP: &str = "lemmy-internal-nginx";
pub const NGINX_SERVICE_NAME: &str = "lemmy-internal-nginx";
pub const NGINX_CONFIG_MAP_NAME: &str = "lemmy-internal-nginx-conf";
pub const NGINX_PORT: i32 = 8080;
pub const NGINX_IMAGE: &str = "cgr.dev/chainguard/nginx:1.25";

const NGINX_CONFIG_KEY: &str = "nginx.conf";

// Adapted from https://github.com/LemmyNet/lemmy-ansible/blob/main/templates/nginx_internal.conf
const NGINX_CONFIG_TEMPLATE: &str = r#"
worker_processes auto;
events {
    worker_connections 1024;
}
http {
    upstream lemmy {
        # this needs to map to the lemmy (server) service hostname
        server "__BACKEND_UPSTREAM__";
    }
    upstream lemmy-ui {
        # this needs to map to the lemmy-ui service hostname
        server "__UI_UPSTREAM__";
    }

    server {
        listen __LISTEN_PORT__;

        # Upload limit, relevant for pictrs
        client_max_body_size 20M;

        add_header X-Frame-Options SAMEORIGIN;
        add_header X-Content-Type-Options nosniff;
        add_header X-XSS-Protection "1; mode=block";

        # frontend general requests
        location / {
            # distinguish between ui requests and backend
            # don't change lemmy-ui or lemmy here, they refer to the upstream definitions on top
            set $proxpass "http://lemmy-ui";

            if ($http_accept = "application/activity+json") {
              set $proxpass "http://lemmy";
            }
            if ($http_accept = "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"") {
              set $proxpass "http://lemmy";
            }
            if ($request_method = POST) {
              set $proxpass "http://lemmy";
            }
            proxy_pass $proxpass;

            rewrite ^(.+)/+$ $1 permanent;
            # Send actual client IP upstream
            proxy_set_header X-Real-IP $remote_addr;
            proxy_set_header Host $host;
            proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        }

        # backend
        location ~ ^/(api|pictrs|feeds|nodeinfo|.well-known) {
            proxy_pass "http://lemmy";
            # proxy common stuff
            proxy_http_version 1.1;
            proxy_set_header Upgrade $http_upgrade;
            proxy_set_header Connection "upgrade";

            # Send actual client IP upstream
            proxy_set_header X-Real-IP $remote_addr;
            proxy_set_header Host $host;
            proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        }
    }
}
"#;

/// Render the nginx configuration for the given upstreams.
pub fn nginx_config(backend_upstream: &str, ui_upstream: &str) -> String {
    NGINX_CONFIG_TEMPLATE
        .replace("__BACKEND_UPSTREAM__", backend_upstream)
        .replace("__UI_UPSTREAM__", ui_upstream)
        .replace("__LISTEN_PORT__", &NGINX_PORT.to_string())
}

pub fn config_map(cx: &Context) -> ConfigMap {
    cx.config_map(
        NGINX_CONFIG_MAP_NAME,
        BTreeMap::from_iter([(
            NGINX_CONFIG_KEY.to_owned(),
            nginx_config(
                &format!("{BACKEND_SERVICE_NAME}:{BACKEND_PORT}"),
                &format!("{UI_SERVICE_NAME}:{UI_PORT}"),
            ),
        )]),
    )
}

fn empty_dir(name: &str) -> Volume {
    Volume {
        name: name.to_owned(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

pub fn deployment(cx: &Context) -> Deployment {
    let resources = ResourceConfig::from(custom_container_resources(&CustomContainerSize::new(
        "50m",
        mebibytes(50),
    )));
    cx.deployment(
        NGINX_APP,
        NGINX_APP,
        PodSpec {
            containers: vec![Container {
                name: "nginx".to_owned(),
                image: Some(NGINX_IMAGE.to_owned()),
                ports: Some(vec![ContainerPort {
                    container_port: NGINX_PORT,
                    name: Some("http".to_owned()),
                    ..Default::default()
                }]),
                security_context: Some(restricted_security_context()),
                resources: Some(resources.into()),
                // tmp and /var/run must be writable
                volume_mounts: Some(vec![
                    VolumeMount {
                        mount_path: "/var/lib/nginx/tmp".to_owned(),
                        name: "tmp".to_owned(),
                        ..Default::default()
                    },
                    VolumeMount {
                        mount_path: "/var/run".to_owned(),
                        name: "varrun".to_owned(),
                        ..Default::default()
                    },
                    VolumeMount {
                        mount_path: "/etc/nginx/nginx.conf".to_owned(),
                        name: "config".to_owned(),
                        sub_path: Some(NGINX_CONFIG_KEY.to_owned()),
                        read_only: Some(true),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }],
            volumes: Some(vec![
                empty_dir("tmp"),
                empty_dir("varrun"),
                Volume {
                    name: "config".to_owned(),
                    config_map: Some(ConfigMapVolumeSource {
                        name: NGINX_CONFIG_MAP_NAME.to_owned(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        },
    )
}

pub fn service(cx: &Context) -> Service {
    cx.service(NGINX_SERVICE_NAME, NGINX_APP, NGINX_PORT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn config_points_at_upstreams() {
        let config = nginx_config("lemmy-backend:8536", "lemmy-ui:1234");
        assert!(config.contains("server \"lemmy-backend:8536\";"));
        assert!(config.contains("server \"lemmy-ui:1234\";"));
        assert!(config.contains("listen 8080;"));
        assert!(!config.contains("__"));
    }

    #[test]
    fn config_map_holds_rendered_config() {
        let config_map = config_map(&Context::default());
        let data = config_map.data.expect("data");
        assert_eq!(
            data.get("nginx.conf"),
            Some(&nginx_config("lemmy-backend:8536", "lemmy-ui:1234"))
        );
    }

    #[test]
    fn deployment_resources_and_mounts() {
        let deployment = serde_json::to_value(deployment(&Context::default())).unwrap();
        let container = &deployment["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["image"], json!("cgr.dev/chainguard/nginx:1.25"));
        assert_eq!(
            container["resources"],
            json!({
                "requests": { "cpu": "50m" },
                "limits": { "memory": "50Mi" },
            })
        );
        assert_eq!(
            container["volumeMounts"][2],
            json!({
                "mountPath": "/etc/nginx/nginx.conf",
                "name": "config",
                "readOnly": true,
                "subPath": "nginx.conf",
            })
        );
        assert_eq!(
            deployment["spec"]["selector"],
            json!({ "matchLabels": { "app": "lemmy-internal-nginx" } })
        );
    }

    #[test]
    fn service_exposes_http() {
        let service = serde_json::to_value(service(&Context::default())).unwrap();
        assert_eq!(
            service["spec"],
            json!({
                "ports": [{
                    "name": "http",
                    "port": 8080,
                    "protocol": "TCP",
                    "targetPort": 8080,
                }],
                "selector": { "app": "lemmy-internal-nginx" },
                "type": "ClusterIP",
            })
        );
    }
}
