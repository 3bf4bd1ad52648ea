use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::ResourceRequirements, apimachinery::pkg::api::resource::Quantity,
};
use lemmy_k8s_common::container_sizes::{
    mebibyte_quantity, ContainerResources, ResourceSetting, ServiceKind,
};

/// Container requests and limits in Kubernetes quantities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceConfig {
    /// Cpu resource request
    pub cpu_request: Option<Quantity>,
    /// Cpu resource limit
    pub cpu_limit: Option<Quantity>,
    /// Memory resource request
    pub memory_request: Option<Quantity>,
    /// Memory resource limit
    pub memory_limit: Option<Quantity>,
}

impl ResourceConfig {
    pub fn from_setting(setting: Option<&ResourceSetting>, service: ServiceKind) -> Self {
        setting
            .cloned()
            .unwrap_or_default()
            .container_resources(service)
            .into()
    }
}

impl From<ContainerResources> for ResourceConfig {
    fn from(value: ContainerResources) -> Self {
        let cpu = value.cpu.unwrap_or_default();
        let memory = value.memory.unwrap_or_default();
        Self {
            cpu_request: cpu.request.map(|cpu| Quantity(cpu.amount)),
            cpu_limit: cpu.limit.map(|cpu| Quantity(cpu.amount)),
            memory_request: memory.request.map(|m| Quantity(mebibyte_quantity(m))),
            memory_limit: memory.limit.map(|m| Quantity(mebibyte_quantity(m))),
        }
    }
}

impl From<ResourceConfig> for ResourceRequirements {
    fn from(value: ResourceConfig) -> Self {
        fn quantities(
            cpu: Option<Quantity>,
            memory: Option<Quantity>,
        ) -> Option<BTreeMap<String, Quantity>> {
            let mut map = BTreeMap::new();
            cpu.and_then(|cpu| map.insert("cpu".to_owned(), cpu));
            memory.and_then(|memory| map.insert("memory".to_owned(), memory));
            (!map.is_empty()).then_some(map)
        }
        Self {
            requests: quantities(value.cpu_request, value.memory_request),
            limits: quantities(value.cpu_limit, value.memory_limit),
            ..Default::default()
        }
    }
}
