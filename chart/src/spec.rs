//! Place all values types into a single module so they can be used as a lightweight dependency
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{NodeAffinity, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use lemmy_k8s_common::container_sizes::ResourceSetting;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters used to generate the manifests of a Lemmy instance, akin to a Helm values.yaml.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LemmyProps {
    /// Hostname of the Lemmy instance, e.g. lemmy.world
    pub hostname: String,
    /// Namespace all manifests are placed in.
    /// When unset the manifests carry no namespace and land in the one they are applied to.
    pub namespace: Option<String>,
    /// Cert-manager Issuer or ClusterIssuer used to generate HTTPS certificates.
    pub cert_manager_issuer: IssuerRef,
    /// Ingress class used for terminating TLS.
    #[serde(alias = "IngressClassName")]
    pub ingress_class_name: Option<String>,
    /// Describes how the database cluster should be deployed.
    pub database: LemmyDatabaseProps,
    /// S3 compatible bucket used by pict-rs to store uploaded pictures.
    #[serde(alias = "pictRsBucket")]
    pub pictrs_bucket: PictrsBucketSpec,
    /// Storage for the pict-rs metadata repository.
    pub pictrs_storage: Option<PersistentStorageSpec>,
    /// Settings rendered into the Lemmy backend configuration file.
    #[serde(alias = "lemmyDotHJSON")]
    pub lemmy_config: Option<LemmyConfigSpec>,
    /// Value of the RUST_LOG env var on the backend and pict-rs containers. Defaults to "warn".
    pub rust_log: Option<String>,
    /// OpenTelemetry collector that logs and traces are sent to.
    #[serde(alias = "opentelemetryCollectorURL")]
    pub opentelemetry_collector_url: Option<String>,
    /// Overrides for the Lemmy backend deployment.
    pub lemmy_backend_pod: Option<DeploymentValues>,
    /// Overrides for the Lemmy UI deployment.
    #[serde(alias = "lemmyUIPod")]
    pub lemmy_ui_pod: Option<DeploymentValues>,
    /// Overrides for the pict-rs deployment.
    #[serde(alias = "pictRSPod")]
    pub pictrs_pod: Option<DeploymentValues>,
}

/// Reference to a cert-manager issuer.
/// See the issuerRef block in <https://cert-manager.io/docs/usage/certificate/>.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRef {
    /// API group of the issuer, usually "cert-manager.io".
    pub group: String,
    /// Either "Issuer" or "ClusterIssuer".
    pub kind: String,
    /// Name of the issuer.
    pub name: String,
}

/// Describes how the Postgres cluster is deployed by the postgres-operator.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LemmyDatabaseProps {
    /// How many database servers to run. Only one can be primary, a second instance gives a
    /// standby for HA. Defaults to 1.
    pub number_of_instances: Option<i32>,
    /// Size of the database containers. Defaults to solo.
    pub container_size: Option<ResourceSetting>,
    /// Whether to run the built in PgBouncer pooler. Defaults to false.
    pub enable_connection_pooling: Option<bool>,
    /// Persistent volume configuration of the database cluster.
    pub storage: Option<DatabaseStorageSpec>,
    /// WAL-G backups to S3.
    pub backups: DatabaseBackupSpec,
    /// Node affinity of the database pods.
    pub node_affinity: Option<NodeAffinity>,
    /// Tolerations of the database pods.
    pub tolerations: Option<Vec<Toleration>>,
}

/// Persistent volume configuration of the database cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStorageSpec {
    /// Size of the volume. Defaults to 1Gi.
    pub size: Option<Quantity>,
    /// Storage class of the volume.
    pub storage_class: Option<String>,
}

/// WAL-G backup configuration.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseBackupSpec {
    /// S3 endpoint URL
    pub s3_endpoint: String,
    /// Bucket the backups are written to
    pub bucket_name: String,
    /// Use path style addressing (endpoint/bucket) instead of virtual hosted style
    /// (bucket.endpoint). Defaults to false.
    pub use_path_style: Option<bool>,
    /// Disable server side encryption so files are visible in the provider web UI.
    /// Defaults to false.
    #[serde(alias = "disableSSE")]
    pub disable_sse: Option<bool>,
    /// Backup schedule. Defaults to every day at 06:00 UTC.
    pub backup_cron: Option<String>,
}

/// S3 compatible bucket for pict-rs.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PictrsBucketSpec {
    /// S3 endpoint URL
    pub endpoint: String,
    /// Use path style addressing
    #[serde(alias = "use_path_style")]
    pub use_path_style: bool,
    /// Name of the bucket
    #[serde(alias = "bucket_name")]
    pub bucket_name: String,
    /// Bucket region
    pub region: String,
    /// Secret with the keys "access_key" and "secret_key".
    /// Defaults to the pgbk-s3-credentials secret used for database backups.
    #[serde(alias = "access_secret_name")]
    pub access_secret_name: Option<String>,
}

/// Describes a persistent volume claim.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistentStorageSpec {
    /// Size of the persistent disk to request
    pub size: Option<Quantity>,
    /// Name of the storage class for the PVC of the container
    pub class: Option<String>,
}

/// Settings rendered into the Lemmy backend configuration.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LemmyConfigSpec {
    /// Outgoing email configuration.
    pub email: Option<EmailSpec>,
}

/// Outgoing email configuration.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSpec {
    /// Hostname and port of the SMTP server
    #[serde(alias = "smtp_server")]
    pub smtp_server: String,
    /// Secret with the keys "username" and "password" for SMTP auth
    #[serde(alias = "smtp_creds_secret")]
    pub smtp_creds_secret: Option<String>,
    /// Address to send emails from, e.g. "noreply@your-instance.com"
    #[serde(alias = "smtp_from_address")]
    pub smtp_from_address: String,
    /// One of none, tls or starttls
    #[serde(alias = "tls_type")]
    pub tls_type: String,
}

/// Common values that can be set on any generated Deployment.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentValues {
    /// Image of the main container. Pin a version, don't use latest.
    pub image: Option<String>,
    /// Resources of the main container, a preset name or a custom size.
    pub container_size: Option<ResourceSetting>,
    /// Number of replicas
    pub replicas: Option<i32>,
    /// Node selector of the pods
    pub node_selector: Option<BTreeMap<String, String>>,
    /// Node affinity of the pods
    pub node_affinity: Option<NodeAffinity>,
    /// Tolerations of the pods
    pub tolerations: Option<Vec<Toleration>>,
}
