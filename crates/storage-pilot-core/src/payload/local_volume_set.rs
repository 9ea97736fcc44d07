//! LocalVolumeSet payload and local disk matching

use super::{ObjectMeta, Payload, models};
use crate::error::CoreError;
use crate::state::CreateLocalVolumeSet;
use crate::types::{DeviceType, HOSTNAME_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A device reported by the local storage discovery daemon
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    pub node: String,
    pub path: String,
    pub device_type: String,
    /// Size in bytes
    pub size: u64,
    pub rotational: bool,
    /// Only `Available` devices can back a volume set
    pub status: String,
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

/// Check the disk filter of the volume set form
pub fn is_valid_disk_filter(lvs: &CreateLocalVolumeSet) -> bool {
    let max_size_ok = lvs.max_disk_size.trim().is_empty()
        || parse_positive(&lvs.max_disk_size).is_some_and(|max| max >= lvs.min_disk_size);
    let limit_ok = lvs.max_disk_limit.trim().is_empty() || parse_positive(&lvs.max_disk_limit).is_some();
    lvs.min_disk_size >= 1 && max_size_ok && limit_ok && !lvs.device_type.is_empty()
}

/// Whether a discovered device passes the volume set filter
pub fn device_matches(lvs: &CreateLocalVolumeSet, device: &DiscoveredDevice) -> bool {
    if device.status != "Available" {
        return false;
    }
    let Some(device_type) = DeviceType::from_discovery(&device.device_type) else {
        return false;
    };
    if !lvs.device_type.contains(&device_type) || !lvs.disk_type.accepts(device.rotational) {
        return false;
    }
    let unit = lvs.disk_size_unit.bytes();
    if device.size < lvs.min_disk_size.saturating_mul(unit) {
        return false;
    }
    match parse_positive(&lvs.max_disk_size) {
        Some(max) => device.size <= max.saturating_mul(unit),
        None => true,
    }
}

/// Nodes eligible for the volume set that have at least one matching device
pub fn matching_nodes(
    lvs: &CreateLocalVolumeSet,
    all_nodes: &[String],
    devices: &[DiscoveredDevice],
) -> BTreeSet<String> {
    let candidates: BTreeSet<&str> = if lvs.lvs_is_select_nodes {
        lvs.lvs_select_nodes.iter().map(String::as_str).collect()
    } else {
        all_nodes.iter().map(String::as_str).collect()
    };

    devices
        .iter()
        .filter(|d| candidates.contains(d.node.as_str()) && device_matches(lvs, d))
        .map(|d| d.node.clone())
        .collect()
}

/// Matching devices on the chart nodes, honouring the per-node disk limit
pub fn matching_devices<'a>(
    lvs: &CreateLocalVolumeSet,
    devices: &'a [DiscoveredDevice],
) -> Vec<&'a DiscoveredDevice> {
    let limit = parse_positive(&lvs.max_disk_limit).map(|l| l as usize);
    let mut per_node: std::collections::BTreeMap<&str, usize> = Default::default();
    devices
        .iter()
        .filter(|d| lvs.chart_nodes.contains(&d.node) && device_matches(lvs, d))
        .filter(|d| {
            let taken = per_node.entry(d.node.as_str()).or_default();
            *taken += 1;
            limit.is_none_or(|l| *taken <= l)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVolumeSet {
    pub metadata: ObjectMeta,
    pub spec: LocalVolumeSetSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVolumeSetSpec {
    pub storage_class_name: String,
    pub volume_mode: String,
    pub device_inclusion_spec: DeviceInclusionSpec,
    pub node_selector: NodeSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_device_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInclusionSpec {
    pub device_types: Vec<String>,
    pub device_mechanical_properties: Vec<String>,
    pub min_size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorTerm {
    pub match_expressions: Vec<MatchExpression>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchExpression {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

/// Volume set creating one local PV per matching device on the chart nodes
pub fn local_volume_set_payload(
    lvs: &CreateLocalVolumeSet,
    namespace: &str,
) -> Result<Payload, CoreError> {
    let name = lvs.volume_set_name.trim();
    if name.is_empty() {
        return Err(CoreError::Payload("volume set name is empty".to_string()));
    }
    let unit = lvs.disk_size_unit.as_str();

    let volume_set = LocalVolumeSet {
        metadata: ObjectMeta::named(name, namespace),
        spec: LocalVolumeSetSpec {
            storage_class_name: name.to_string(),
            volume_mode: lvs.disk_mode.as_str().to_string(),
            device_inclusion_spec: DeviceInclusionSpec {
                device_types: lvs.device_type.iter().map(|d| d.as_str().to_string()).collect(),
                device_mechanical_properties: lvs
                    .disk_type
                    .mechanical_properties()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                min_size: format!("{}{}", lvs.min_disk_size, unit),
                max_size: parse_positive(&lvs.max_disk_size).map(|max| format!("{}{}", max, unit)),
            },
            node_selector: NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: vec![MatchExpression {
                        key: HOSTNAME_LABEL.to_string(),
                        operator: "In".to_string(),
                        values: lvs.chart_nodes.iter().cloned().collect(),
                    }],
                }],
            },
            max_device_count: parse_positive(&lvs.max_disk_limit),
        },
    };

    Payload::from_object(models::LOCAL_VOLUME_SET, Some(namespace), &volume_set)
}
