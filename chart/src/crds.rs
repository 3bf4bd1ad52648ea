//! Custom resources of the operators the chart hands work to.
//! Only the fields the chart sets are modeled.
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{NodeAffinity, Toleration};
use kube::CustomResource;
use lemmy_k8s_common::container_sizes::PostgresqlResources;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::IssuerRef;

/// Postgres cluster managed by the Zalando postgres-operator.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "acid.zalan.do",
    version = "v1",
    kind = "postgresql",
    root = "Postgresql",
    plural = "postgresqls",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlSpec {
    /// Owning team. Cluster names must be prefixed with it.
    pub team_id: String,
    /// Number of Postgres pods
    pub number_of_instances: i32,
    /// Run a PgBouncer pooler in front of the primary
    pub enable_connection_pooler: bool,
    /// Run a PgBouncer pooler in front of the replicas
    pub enable_replica_connection_pooler: bool,
    /// Roles to create, keyed by role name
    pub users: BTreeMap<String, Vec<UserFlag>>,
    /// Databases to create, mapping database name to owner
    pub databases: BTreeMap<String, String>,
    /// Postgres server settings
    pub postgresql: PostgresqlVersionSpec,
    /// Data volume
    pub volume: PostgresqlVolume,
    /// Container resources
    pub resources: PostgresqlResources,
    /// Node affinity of the database pods
    pub node_affinity: NodeAffinity,
    /// Tolerations of the database pods
    pub tolerations: Vec<Toleration>,
}

/// Role flags understood by the postgres-operator.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserFlag {
    /// Role bypasses every permission check
    Superuser,
    /// Role may create databases
    Createdb,
}

/// Postgres server settings.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
pub struct PostgresqlVersionSpec {
    /// Major version, e.g. "15"
    pub version: String,
}

/// Persistent volume of a Postgres cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlVolume {
    /// Volume size
    pub size: String,
    /// Storage class of the volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// TLS certificate issued by cert-manager.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "cert-manager.io",
    version = "v1",
    kind = "Certificate",
    plural = "certificates",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Secret the signed certificate is stored in
    pub secret_name: String,
    /// Issuer that signs the certificate
    pub issuer_ref: IssuerRef,
    /// Subject alternative names
    pub dns_names: Vec<String>,
}
