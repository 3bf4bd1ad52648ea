//! Size presets for the various Lemmy containers.
//!
//! These are rough estimates and haven't been load tested:
//!
//! | size   | users per container |
//! |--------|---------------------|
//! | solo   | ~1-5                |
//! | micro  | ~10-20              |
//! | small  | ~50-100             |
//! | medium | ~200-400            |
//! | large  | ~1000-2000          |
//! | xlarge | ~5000-10000         |
//!
//! A preset or custom size is rendered into one of two resource blocks: the
//! string based block of the postgres-operator `postgresql` resource, or the
//! structured block used when building container specs.
use byte_unit::{Byte, Unit};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of bytes in a mebibyte.
pub const MEBIBYTE: u64 = 1024 * 1024;

/// Named capacity bracket used to select a preset.
#[derive(
    Serialize, Deserialize, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ContainerSize {
    /// ~1-5 users
    #[default]
    Solo,
    /// ~10-20 users
    Micro,
    /// ~50-100 users
    Small,
    /// ~200-400 users
    Medium,
    /// ~1000-2000 users
    Large,
    /// ~5000-10000 users
    Xlarge,
}

impl ContainerSize {
    /// Every size, smallest first.
    pub const ALL: [ContainerSize; 6] = [
        ContainerSize::Solo,
        ContainerSize::Micro,
        ContainerSize::Small,
        ContainerSize::Medium,
        ContainerSize::Large,
        ContainerSize::Xlarge,
    ];
}

/// Lemmy component a size applies to.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Lemmy backend
    Backend,
    /// Lemmy UI
    Ui,
    /// pict-rs image storage
    Pictrs,
    /// Postgres database
    Database,
}

impl ServiceKind {
    /// Every service kind.
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Backend,
        ServiceKind::Ui,
        ServiceKind::Pictrs,
        ServiceKind::Database,
    ];
}

/// Explicit CPU request and memory limit, bypassing the presets.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomContainerSize {
    /// Kubernetes CPU quantity, e.g. "500m" or "1". Passed through unchecked.
    pub cpu_request: String,
    /// Memory limit. Accepts a byte count or a string such as "512Mi" or "3 GiB".
    #[serde(with = "memory_limit")]
    #[schemars(schema_with = "memory_limit::schema")]
    pub memory_limit: Byte,
}

impl CustomContainerSize {
    /// Construct a custom size.
    pub fn new(cpu_request: impl Into<String>, memory_limit: Byte) -> Self {
        Self {
            cpu_request: cpu_request.into(),
            memory_limit,
        }
    }
}

/// Either a named preset or an explicit size.
///
/// In values files a plain string selects a preset, a mapping selects a custom size.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(untagged)]
pub enum ResourceSetting {
    /// Look the size up in the preset table.
    Preset(ContainerSize),
    /// Use the given size as is.
    Custom(CustomContainerSize),
}

impl Default for ResourceSetting {
    fn default() -> Self {
        ResourceSetting::Preset(ContainerSize::default())
    }
}

impl From<ContainerSize> for ResourceSetting {
    fn from(value: ContainerSize) -> Self {
        ResourceSetting::Preset(value)
    }
}

impl From<CustomContainerSize> for ResourceSetting {
    fn from(value: CustomContainerSize) -> Self {
        ResourceSetting::Custom(value)
    }
}

impl ResourceSetting {
    /// Resolve the setting into the postgres-operator resource block.
    pub fn postgres_resources(&self, service: ServiceKind) -> PostgresqlResources {
        match self {
            ResourceSetting::Preset(size) => preset_postgres_resources(service, *size),
            ResourceSetting::Custom(size) => custom_postgres_resources(size),
        }
    }

    /// Resolve the setting into the container resource block.
    pub fn container_resources(&self, service: ServiceKind) -> ContainerResources {
        match self {
            ResourceSetting::Preset(size) => preset_container_resources(service, *size),
            ResourceSetting::Custom(size) => custom_container_resources(size),
        }
    }
}

/// CPU/memory quantities as plain strings.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct ResourceDescription {
    /// CPU quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Resource block of the `acid.zalan.do/v1` `postgresql` resource.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone, JsonSchema)]
pub struct PostgresqlResources {
    /// Resource requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceDescription>,
    /// Resource limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceDescription>,
}

/// A CPU amount in Kubernetes quantity syntax.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CpuAmount {
    /// Quantity string, e.g. "250m"
    pub amount: String,
}

/// CPU request and limit of a container.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct CpuResources {
    /// CPU request
    pub request: Option<CpuAmount>,
    /// CPU limit
    pub limit: Option<CpuAmount>,
}

/// Memory request and limit of a container.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MemoryResources {
    /// Memory request
    pub request: Option<Byte>,
    /// Memory limit
    pub limit: Option<Byte>,
}

/// Structured resource block used when building containers.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ContainerResources {
    /// CPU resources
    pub cpu: Option<CpuResources>,
    /// Memory resources
    pub memory: Option<MemoryResources>,
}

/// Size of `n` mebibytes.
pub const fn mebibytes(n: u64) -> Byte {
    match Byte::from_u64_with_unit(n, Unit::MiB) {
        Some(byte) => byte,
        None => Byte::MAX,
    }
}

/// Size of `n` gibibytes.
pub const fn gibibytes(n: u64) -> Byte {
    match Byte::from_u64_with_unit(n, Unit::GiB) {
        Some(byte) => byte,
        None => Byte::MAX,
    }
}

/// Whole mebibytes in `size`. Deserialized limits are always whole mebibytes.
pub const fn to_mebibytes(size: Byte) -> u64 {
    size.as_u64() / MEBIBYTE
}

/// Render `size` as a mebibyte quantity string, e.g. "1024Mi".
pub fn mebibyte_quantity(size: Byte) -> String {
    format!("{}Mi", to_mebibytes(size))
}

const fn preset_entry(cpu_request: &'static str, memory_limit: Byte) -> (&'static str, Byte) {
    (cpu_request, memory_limit)
}

/// Preset table. The match is exhaustive so a new service or size must be added here.
const fn preset_table(service: ServiceKind, size: ContainerSize) -> (&'static str, Byte) {
    use ContainerSize::*;
    match service {
        ServiceKind::Backend | ServiceKind::Pictrs => match size {
            Solo => preset_entry("20m", mebibytes(100)),
            Micro => preset_entry("50m", mebibytes(100)),
            Small => preset_entry("200m", mebibytes(200)),
            Medium => preset_entry("500m", mebibytes(400)),
            Large => preset_entry("1", gibibytes(1)),
            Xlarge => preset_entry("2", gibibytes(2)),
        },
        ServiceKind::Ui => match size {
            Solo => preset_entry("10m", mebibytes(200)),
            Micro => preset_entry("50m", mebibytes(200)),
            Small => preset_entry("100m", mebibytes(300)),
            Medium => preset_entry("500m", mebibytes(500)),
            Large => preset_entry("1", gibibytes(1)),
            Xlarge => preset_entry("2", gibibytes(4)),
        },
        ServiceKind::Database => match size {
            Solo => preset_entry("50m", gibibytes(1)),
            Micro => preset_entry("100m", gibibytes(1)),
            Small => preset_entry("200m", gibibytes(2)),
            Medium => preset_entry("500m", gibibytes(4)),
            Large => preset_entry("1", gibibytes(6)),
            Xlarge => preset_entry("2", gibibytes(8)),
        },
    }
}

/// Look up the preset size for a service.
pub fn preset(service: ServiceKind, size: ContainerSize) -> CustomContainerSize {
    let (cpu_request, memory_limit) = preset_table(service, size);
    CustomContainerSize::new(cpu_request, memory_limit)
}

/// Preset resources in the postgres-operator shape.
pub fn preset_postgres_resources(service: ServiceKind, size: ContainerSize) -> PostgresqlResources {
    custom_postgres_resources(&preset(service, size))
}

/// Preset resources in the container shape.
pub fn preset_container_resources(service: ServiceKind, size: ContainerSize) -> ContainerResources {
    custom_container_resources(&preset(service, size))
}

/// Custom resources in the postgres-operator shape.
pub fn custom_postgres_resources(size: &CustomContainerSize) -> PostgresqlResources {
    PostgresqlResources {
        requests: Some(ResourceDescription {
            cpu: Some(size.cpu_request.clone()),
            memory: None,
        }),
        limits: Some(ResourceDescription {
            cpu: None,
            memory: Some(mebibyte_quantity(size.memory_limit)),
        }),
    }
}

/// Custom resources in the container shape.
pub fn custom_container_resources(size: &CustomContainerSize) -> ContainerResources {
    ContainerResources {
        cpu: Some(CpuResources {
            request: Some(CpuAmount {
                amount: size.cpu_request.clone(),
            }),
            limit: None,
        }),
        memory: Some(MemoryResources {
            request: None,
            limit: Some(size.memory_limit),
        }),
    }
}

/// Serde adapter for memory limits.
///
/// Serializes the byte count, deserializes either a byte count or a size string
/// where unit prefixes are binary ("Mi", "MiB") or decimal ("M", "MB").
/// Limits must be a whole number of mebibytes.
pub mod memory_limit {
    use std::fmt;

    use byte_unit::{Byte, Unit};
    use schemars::{
        gen::SchemaGenerator,
        schema::{InstanceType, Schema, SchemaObject, SingleOrVec},
    };
    use serde::{de, Deserializer, Serializer};

    use super::MEBIBYTE;

    /// Serialize a memory limit as its byte count.
    pub fn serialize<S>(value: &Byte, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_u64())
    }

    /// Schema accepting a byte count or a size string.
    pub fn schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(SingleOrVec::Vec(vec![
                InstanceType::Integer,
                InstanceType::String,
            ])),
            ..Default::default()
        }
        .into()
    }

    /// Parse a size string. Unit prefixes are case sensitive and bit units are refused.
    fn parse(v: &str) -> Result<Byte, String> {
        let v = v.trim();
        let unit = v
            .find(|c: char| c.is_ascii_alphabetic())
            .map(|start| v[start..].trim())
            .unwrap_or_default();
        if unit.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(format!(
                "unit {unit:?} must start with an upper case letter, e.g. \"512Mi\""
            ));
        }
        if !unit.is_empty() {
            let unit = Unit::parse_str(unit, false, true).map_err(|err| err.to_string())?;
            if unit.is_bit() {
                return Err(format!("unit {:?} is in bits, use bytes", unit.as_str()));
            }
        }
        let size = Byte::parse_str(v, false).map_err(|err| err.to_string())?;
        whole_mebibytes(size)
    }

    /// Refuse sizes that are not a whole number of mebibytes.
    fn whole_mebibytes(size: Byte) -> Result<Byte, String> {
        if size.as_u64() % MEBIBYTE == 0 {
            Ok(size)
        } else {
            Err(format!(
                "{} bytes is not a whole number of mebibytes",
                size.as_u64()
            ))
        }
    }

    /// Deserialize a memory limit from a byte count or a size string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Byte, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MemoryLimitVisitor;

        impl<'de> de::Visitor<'de> for MemoryLimitVisitor {
            type Value = Byte;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte count or a size string such as \"512Mi\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Byte, E> {
                whole_mebibytes(Byte::from_u64(v))
                    .map_err(|err| E::custom(format!("invalid memory limit {v}: {err}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Byte, E> {
                let size = Byte::from_i64(v)
                    .ok_or_else(|| E::custom(format!("negative memory limit: {v}")))?;
                whole_mebibytes(size)
                    .map_err(|err| E::custom(format!("invalid memory limit {v}: {err}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Byte, E> {
                parse(v).map_err(|err| E::custom(format!("invalid memory limit {v:?}: {err}")))
            }
        }

        deserializer.deserialize_any(MemoryLimitVisitor)
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn database_solo_postgres_resources() {
        let resources = preset_postgres_resources(ServiceKind::Database, ContainerSize::Solo);
        expect![[r#"
            PostgresqlResources {
                requests: Some(
                    ResourceDescription {
                        cpu: Some(
                            "50m",
                        ),
                        memory: None,
                    },
                ),
                limits: Some(
                    ResourceDescription {
                        cpu: None,
                        memory: Some(
                            "1024Mi",
                        ),
                    },
                ),
            }
        "#]]
        .assert_debug_eq(&resources);
    }

    #[test]
    fn database_solo_serializes_without_empty_fields() {
        let resources = preset_postgres_resources(ServiceKind::Database, ContainerSize::Solo);
        assert_eq!(
            serde_json::to_value(resources).unwrap(),
            serde_json::json!({
                "requests": { "cpu": "50m" },
                "limits": { "memory": "1024Mi" },
            })
        );
    }

    #[test]
    fn backend_xlarge_container_resources() {
        let resources = preset_container_resources(ServiceKind::Backend, ContainerSize::Xlarge);
        assert_eq!(
            resources,
            ContainerResources {
                cpu: Some(CpuResources {
                    request: Some(CpuAmount {
                        amount: "2".to_owned()
                    }),
                    limit: None,
                }),
                memory: Some(MemoryResources {
                    request: None,
                    limit: Some(Byte::from_u64(2 * 1024 * 1024 * 1024)),
                }),
            }
        );
    }

    #[test]
    fn custom_size_postgres_resources() {
        let size = CustomContainerSize::new("750m", gibibytes(3));
        let resources = custom_postgres_resources(&size);
        assert_eq!(
            resources,
            PostgresqlResources {
                requests: Some(ResourceDescription {
                    cpu: Some("750m".to_owned()),
                    memory: None,
                }),
                limits: Some(ResourceDescription {
                    cpu: None,
                    memory: Some("3072Mi".to_owned()),
                }),
            }
        );
    }

    #[test]
    fn shapes_agree_for_every_preset() {
        for service in ServiceKind::ALL {
            for size in ContainerSize::ALL {
                let postgres = preset_postgres_resources(service, size);
                let container = preset_container_resources(service, size);

                let cpu = postgres.requests.and_then(|r| r.cpu);
                let amount = container.cpu.and_then(|c| c.request).map(|r| r.amount);
                assert_eq!(cpu, amount, "{service:?}/{size:?} cpu");

                let memory = postgres
                    .limits
                    .and_then(|l| l.memory)
                    .expect("memory limit");
                let mebibytes: u64 = memory
                    .strip_suffix("Mi")
                    .expect("Mi suffix")
                    .parse()
                    .expect("integer mebibytes");
                let limit = container
                    .memory
                    .and_then(|m| m.limit)
                    .expect("memory limit");
                assert_eq!(mebibytes * MEBIBYTE, limit.as_u64(), "{service:?}/{size:?} memory");
            }
        }
    }

    #[test]
    fn custom_size_equal_to_preset_resolves_the_same() {
        for service in ServiceKind::ALL {
            for size in ContainerSize::ALL {
                let custom = preset(service, size);
                assert_eq!(
                    custom_postgres_resources(&custom),
                    preset_postgres_resources(service, size)
                );
                assert_eq!(
                    custom_container_resources(&custom),
                    preset_container_resources(service, size)
                );
            }
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let setting = ResourceSetting::Custom(CustomContainerSize::new("1", mebibytes(512)));
        assert_eq!(
            setting.postgres_resources(ServiceKind::Ui),
            setting.postgres_resources(ServiceKind::Ui)
        );
        assert_eq!(
            setting.container_resources(ServiceKind::Ui),
            setting.container_resources(ServiceKind::Ui)
        );
    }

    #[test]
    fn setting_dispatch_matches_preset() {
        for service in ServiceKind::ALL {
            let by_name = ResourceSetting::Preset(ContainerSize::Micro);
            let by_value = ResourceSetting::Custom(preset(service, ContainerSize::Micro));
            assert_eq!(
                by_name.postgres_resources(service),
                by_value.postgres_resources(service)
            );
            assert_eq!(
                by_name.container_resources(service),
                by_value.container_resources(service)
            );
        }
    }

    #[test]
    fn custom_setting_ignores_service() {
        let setting = ResourceSetting::Custom(CustomContainerSize::new("300m", mebibytes(256)));
        assert_eq!(
            setting.container_resources(ServiceKind::Backend),
            setting.container_resources(ServiceKind::Database)
        );
    }

    #[test]
    fn partial_mebibytes_are_rejected() {
        for memory_limit in ["100MB", "1572864", "1.5Mi", "512m", "1g", "512Mib"] {
            let result: Result<CustomContainerSize, _> = serde_yaml::from_str(&format!(
                "{{ cpuRequest: 100m, memoryLimit: {memory_limit} }}"
            ));
            assert!(result.is_err(), "{memory_limit} should be rejected");
        }
    }

    #[test]
    fn rejection_names_the_problem() {
        let err = serde_yaml::from_str::<CustomContainerSize>(
            "{ cpuRequest: 100m, memoryLimit: 1572864 }",
        )
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("1572864 bytes is not a whole number of mebibytes"),
            "{err}"
        );
        let err =
            serde_yaml::from_str::<CustomContainerSize>("{ cpuRequest: 100m, memoryLimit: 512m }")
                .unwrap_err();
        assert!(err.to_string().contains("upper case"), "{err}");
    }

    #[test]
    fn whole_decimal_sizes_are_accepted() {
        // 1048576000 bytes is exactly 1000Mi.
        let size: CustomContainerSize =
            serde_yaml::from_str("{ cpuRequest: 100m, memoryLimit: 1048.576MB }").unwrap();
        assert_eq!(mebibyte_quantity(size.memory_limit), "1000Mi");
    }

    #[test]
    fn schema_accepts_byte_counts_and_strings() {
        let schema = serde_json::to_value(schemars::schema_for!(CustomContainerSize)).unwrap();
        assert_eq!(
            schema["properties"]["memoryLimit"]["type"],
            serde_json::json!(["integer", "string"])
        );
    }

    #[test]
    fn parse_settings_from_values() {
        let settings: Vec<ResourceSetting> = serde_yaml::from_str(
            r#"
- micro
- cpuRequest: 750m
  memoryLimit: 3GiB
- cpuRequest: "1"
  memoryLimit: 512Mi
- cpuRequest: 250m
  memoryLimit: 1048576
"#,
        )
        .unwrap();
        assert_eq!(
            settings,
            vec![
                ResourceSetting::Preset(ContainerSize::Micro),
                ResourceSetting::Custom(CustomContainerSize::new("750m", gibibytes(3))),
                ResourceSetting::Custom(CustomContainerSize::new("1", mebibytes(512))),
                ResourceSetting::Custom(CustomContainerSize::new("250m", mebibytes(1))),
            ]
        );
    }

    #[test]
    fn parse_rejects_unknown_size_name() {
        let setting: Result<ResourceSetting, _> = serde_yaml::from_str("huge");
        assert!(setting.is_err());
    }

    #[test]
    fn sizes_are_ordered_by_capacity() {
        let mut sorted = ContainerSize::ALL;
        sorted.sort();
        assert_eq!(sorted, ContainerSize::ALL);
        assert_eq!(
            serde_json::to_value(ContainerSize::ALL).unwrap(),
            serde_json::json!(["solo", "micro", "small", "medium", "large", "xlarge"])
        );
    }
}
