//! Postgres cluster run by the postgres-operator, with WAL-G backups to S3.
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use lemmy_k8s_common::container_sizes::ServiceKind;

use crate::{
    crds::{Postgresql, PostgresqlSpec, PostgresqlVersionSpec, UserFlag},
    error::Result,
    spec::LemmyDatabaseProps,
    storage::VolumeConfig,
    utils::Context,
    Error,
};

/// Name of the postgresql resource. The operator requires the team id as prefix.
pub const DATABASE_CLUSTER_NAME: &str = "lemmy-db";
pub const DATABASE_TEAM_ID: &str = "lemmy";
pub const DATABASE_NAME: &str = "lemmy";
pub const DATABASE_USER: &str = "lemmy";
pub const DATABASE_PORT: i32 = 5432;
pub const POSTGRES_VERSION: &str = "15";

pub const BACKUP_CONFIG_MAP_NAME: &str = "pgbk-s3-config";
/// Secret with the S3 keys for backups, also the default for pict-rs.
pub const BACKUP_CREDENTIALS_SECRET_NAME: &str = "pgbk-s3-credentials";
const DEFAULT_BACKUP_CRON: &str = "0 6 * * *";

/// Name of the secret the operator creates with the credentials of `user`.
pub fn credentials_secret_name(user: &str) -> String {
    format!("{user}.{DATABASE_CLUSTER_NAME}.credentials.postgresql.acid.zalan.do")
}

pub struct DatabaseConfig {
    pub number_of_instances: i32,
    pub enable_connection_pooling: bool,
    pub volume: VolumeConfig,
    pub backup_cron: String,
    pub props: LemmyDatabaseProps,
}

impl DatabaseConfig {
    pub fn from_props(props: &LemmyDatabaseProps) -> Result<Self> {
        let number_of_instances = props.number_of_instances.unwrap_or(1);
        if number_of_instances < 1 {
            return Err(Error::invalid(
                "database.numberOfInstances",
                format!("at least one instance is required, got {number_of_instances}"),
            ));
        }
        if props.backups.s3_endpoint.is_empty() {
            return Err(Error::invalid(
                "database.backups.s3Endpoint",
                "must not be empty",
            ));
        }
        if props.backups.bucket_name.is_empty() {
            return Err(Error::invalid(
                "database.backups.bucketName",
                "must not be empty",
            ));
        }
        Ok(Self {
            number_of_instances,
            enable_connection_pooling: props.enable_connection_pooling.unwrap_or(false),
            volume: VolumeConfig::from_database_spec(
                props.storage.clone(),
                VolumeConfig::default(),
            ),
            backup_cron: props
                .backups
                .backup_cron
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKUP_CRON.to_owned()),
            props: props.clone(),
        })
    }

    /// Environment the operator injects into the Postgres pods to configure WAL-G.
    pub fn backup_config_data(&self) -> BTreeMap<String, String> {
        let backups = &self.props.backups;
        BTreeMap::from_iter(
            [
                ("WAL_S3_BUCKET", backups.bucket_name.clone()),
                ("AWS_ENDPOINT", backups.s3_endpoint.clone()),
                (
                    "AWS_S3_FORCE_PATH_STYLE",
                    backups.use_path_style.unwrap_or(false).to_string(),
                ),
                (
                    "WALG_DISABLE_S3_SSE",
                    backups.disable_sse.unwrap_or(false).to_string(),
                ),
                ("BACKUP_SCHEDULE", self.backup_cron.clone()),
                ("USE_WALG_BACKUP", "true".to_owned()),
                ("USE_WALG_RESTORE", "true".to_owned()),
                ("WAL_BUCKET_SCOPE_PREFIX", "".to_owned()),
                ("WAL_BUCKET_SCOPE_SUFFIX", "".to_owned()),
                ("BACKUP_NUM_TO_RETAIN", "1".to_owned()),
            ]
            .map(|(key, value)| (key.to_owned(), value)),
        )
    }

    pub fn backup_config_map(&self, cx: &Context) -> ConfigMap {
        cx.config_map(BACKUP_CONFIG_MAP_NAME, self.backup_config_data())
    }

    pub fn postgresql_spec(&self) -> PostgresqlSpec {
        PostgresqlSpec {
            // Not used by the operator beyond the name prefix check.
            team_id: DATABASE_TEAM_ID.to_owned(),
            number_of_instances: self.number_of_instances,
            enable_connection_pooler: self.enable_connection_pooling,
            enable_replica_connection_pooler: self.enable_connection_pooling,
            users: BTreeMap::from_iter([
                // database owner
                (
                    "admin".to_owned(),
                    vec![UserFlag::Superuser, UserFlag::Createdb],
                ),
                (DATABASE_USER.to_owned(), vec![]),
            ]),
            databases: BTreeMap::from_iter([(DATABASE_NAME.to_owned(), DATABASE_USER.to_owned())]),
            postgresql: PostgresqlVersionSpec {
                version: POSTGRES_VERSION.to_owned(),
            },
            volume: self.volume.clone().into(),
            resources: self
                .props
                .container_size
                .clone()
                .unwrap_or_default()
                .postgres_resources(ServiceKind::Database),
            node_affinity: self.props.node_affinity.clone().unwrap_or_default(),
            tolerations: self.props.tolerations.clone().unwrap_or_default(),
        }
    }

    pub fn postgresql(&self, cx: &Context) -> Postgresql {
        Postgresql {
            metadata: cx.meta(DATABASE_CLUSTER_NAME),
            spec: self.postgresql_spec(),
        }
    }
}
