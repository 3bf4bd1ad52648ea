use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{PersistentVolumeClaimSpec, ResourceRequirements},
    apimachinery::pkg::api::resource::Quantity,
};

use crate::{
    crds::PostgresqlVolume,
    spec::{DatabaseStorageSpec, PersistentStorageSpec},
};

/// Size and class of a persistent volume, with defaults filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeConfig {
    pub size: Quantity,
    pub storage_class: Option<String>,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            size: Quantity("1Gi".to_owned()),
            storage_class: None,
        }
    }
}

impl VolumeConfig {
    /// Fill unset fields of the pict-rs repository storage spec from `defaults`.
    pub fn from_spec(spec: Option<PersistentStorageSpec>, defaults: Self) -> Self {
        match spec {
            Some(spec) => Self {
                size: spec.size.unwrap_or(defaults.size),
                storage_class: spec.class.or(defaults.storage_class),
            },
            None => defaults,
        }
    }

    /// Fill unset fields of the database storage spec from `defaults`.
    pub fn from_database_spec(spec: Option<DatabaseStorageSpec>, defaults: Self) -> Self {
        Self::from_spec(
            spec.map(|spec| PersistentStorageSpec {
                size: spec.size,
                class: spec.storage_class,
            }),
            defaults,
        )
    }
}

impl From<VolumeConfig> for PersistentVolumeClaimSpec {
    fn from(value: VolumeConfig) -> Self {
        Self {
            access_modes: Some(vec!["ReadWriteOnce".to_owned()]),
            resources: Some(ResourceRequirements {
                requests: Some(BTreeMap::from_iter([("storage".to_owned(), value.size)])),
                ..Default::default()
            }),
            storage_class_name: value.storage_class,
            ..Default::default()
        }
    }
}

impl From<VolumeConfig> for PostgresqlVolume {
    fn from(value: VolumeConfig) -> Self {
        Self {
            size: value.size.0,
            storage_class: value.storage_class,
        }
    }
}
