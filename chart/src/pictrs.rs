//! pict-rs image server storing media in S3 and its metadata in a sled repository.
use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentStrategy},
    core::v1::{
        Container, ContainerPort, EnvVar, PersistentVolumeClaim,
        PersistentVolumeClaimVolumeSource, PodSpec, Service, Volume, VolumeMount,
    },
};
use lemmy_k8s_common::container_sizes::ServiceKind;

use crate::{
    database::BACKUP_CREDENTIALS_SECRET_NAME,
    resources::ResourceConfig,
    spec::{DeploymentValues, LemmyProps, PictrsBucketSpec},
    storage::VolumeConfig,
    utils::{env_secret, env_value, Context},
    DEFAULT_RUST_LOG,
};

pub const PICTRS_APP: &str = "pict-rs";
pub const PICTRS_SERVICE_NAME: &str = "pict-rs";
pub const PICTRS_PORT: i32 = 8080;
pub const PICTRS_IMAGE: &str = "asonix/pictrs:0.4.7";
pub const PICTRS_REPO_PVC_NAME: &str = "pictrs-repo";

const PICTRS_REPO_MOUNT_PATH: &str = "/mnt/repo";

pub struct PictrsConfig {
    pub bucket: PictrsBucketSpec,
    pub volume: VolumeConfig,
    pub rust_log: String,
    pub opentelemetry_url: Option<String>,
    pub values: DeploymentValues,
}

impl PictrsConfig {
    pub fn from_props(props: &LemmyProps) -> Self {
        Self {
            bucket: props.pictrs_bucket.clone(),
            volume: VolumeConfig::from_spec(props.pictrs_storage.clone(), VolumeConfig::default()),
            rust_log: props
                .rust_log
                .clone()
                .unwrap_or_else(|| DEFAULT_RUST_LOG.to_owned()),
            opentelemetry_url: props.opentelemetry_collector_url.clone(),
            values: props.pictrs_pod.clone().unwrap_or_default(),
        }
    }

    pub fn persistent_volume_claim(&self, cx: &Context) -> PersistentVolumeClaim {
        cx.persistent_volume_claim(PICTRS_REPO_PVC_NAME, self.volume.clone().into())
    }

    fn env(&self) -> Vec<EnvVar> {
        let access_secret = self
            .bucket
            .access_secret_name
            .as_deref()
            .unwrap_or(BACKUP_CREDENTIALS_SECRET_NAME);
        let mut env = vec![
            env_value("PICTRS__SERVER__ADDRESS", format!("0.0.0.0:{PICTRS_PORT}")),
            env_value("PICTRS__STORE__TYPE", "object_storage"),
            env_value("PICTRS__STORE__ENDPOINT", self.bucket.endpoint.clone()),
            env_value(
                "PICTRS__STORE__USE_PATH_STYLE",
                self.bucket.use_path_style.to_string(),
            ),
            env_value("PICTRS__STORE__BUCKET_NAME", self.bucket.bucket_name.clone()),
            env_value("PICTRS__STORE__REGION", self.bucket.region.clone()),
            env_secret("PICTRS__STORE__ACCESS_KEY", access_secret, "access_key"),
            env_secret("PICTRS__STORE__SECRET_KEY", access_secret, "secret_key"),
            env_value("PICTRS__REPO__TYPE", "sled"),
            env_value("PICTRS__REPO__PATH", format!("{PICTRS_REPO_MOUNT_PATH}/sled-repo")),
            env_value("RUST_LOG", self.rust_log.clone()),
        ];
        if let Some(url) = &self.opentelemetry_url {
            env.push(env_value("PICTRS__TRACING__OPENTELEMETRY__URL", url.clone()));
        }
        env
    }

    pub fn deployment(&self, cx: &Context) -> Deployment {
        let mut deployment = cx.deployment(
            PICTRS_APP,
            PICTRS_APP,
            PodSpec {
                containers: vec![Container {
                    name: "pict-rs".to_owned(),
                    image: Some(PICTRS_IMAGE.to_owned()),
                    ports: Some(vec![ContainerPort {
                        container_port: PICTRS_PORT,
                        name: Some("http".to_owned()),
                        ..Default::default()
                    }]),
                    env: Some(self.env()),
                    resources: Some(
                        ResourceConfig::from_setting(None, ServiceKind::Pictrs).into(),
                    ),
                    volume_mounts: Some(vec![VolumeMount {
                        mount_path: PICTRS_REPO_MOUNT_PATH.to_owned(),
                        name: "repo".to_owned(),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }],
                volumes: Some(vec![Volume {
                    name: "repo".to_owned(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: PICTRS_REPO_PVC_NAME.to_owned(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            },
        );
        // The sled repository is a ReadWriteOnce volume held by a single pod at a time.
        if let Some(spec) = deployment.spec.as_mut() {
            spec.strategy = Some(DeploymentStrategy {
                type_: Some("Recreate".to_owned()),
                ..Default::default()
            });
        }
        self.values.apply_to_deployment(ServiceKind::Pictrs, deployment)
    }

    pub fn service(&self, cx: &Context) -> Service {
        cx.service(PICTRS_SERVICE_NAME, PICTRS_APP, PICTRS_PORT)
    }
}
