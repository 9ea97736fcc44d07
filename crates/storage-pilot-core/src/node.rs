//! Node snapshots frozen into the wizard state
//!
//! A [`WizardNode`] is derived once from a cluster node object and replaced
//! wholesale whenever the selection changes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Denormalized view of a selected cluster node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardNode {
    pub name: String,
    pub host_name: String,
    /// CPU capacity in cores
    pub cpu: f64,
    /// Memory capacity in bytes
    pub memory: u64,
    pub zone: String,
    pub rack: String,
    pub uid: String,
    pub roles: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<NodeTaint>,
}

/// A node taint as it appears in `spec.taints`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeTaint {
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub effect: String,
}

impl NodeTaint {
    /// The taint reserving a node for storage daemons
    pub fn storage() -> Self {
        Self {
            key: crate::types::STORAGE_TAINT_KEY.to_string(),
            value: "true".to_string(),
            effect: "NoSchedule".to_string(),
        }
    }
}

impl std::fmt::Display for NodeTaint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}:{}", self.key, self.effect)
        } else {
            write!(f, "{}={}:{}", self.key, self.value, self.effect)
        }
    }
}

/// Total CPU cores of a node set
pub fn total_cpu(nodes: &[WizardNode]) -> f64 {
    nodes.iter().map(|n| n.cpu).sum()
}

/// Total memory of a node set in bytes
pub fn total_memory(nodes: &[WizardNode]) -> u64 {
    nodes.iter().map(|n| n.memory).sum()
}

/// Distinct non-empty zones of a node set
pub fn zones(nodes: &[WizardNode]) -> BTreeSet<&str> {
    nodes
        .iter()
        .map(|n| n.zone.as_str())
        .filter(|z| !z.is_empty())
        .collect()
}

/// Flexible scaling spreads OSDs by host when nodes span fewer than three zones
pub fn is_flexible_scaling(nodes: &[WizardNode], stretch: bool) -> bool {
    !stretch && nodes.len() >= crate::types::MINIMUM_NODES && zones(nodes).len() < 3
}

/// Parse a Kubernetes resource quantity into a plain number.
///
/// Binary (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`) and decimal (`k`, `M`, `G`, `T`, `P`)
/// suffixes are supported as well as the `m` milli suffix used for CPU.
pub fn parse_quantity(quantity: &str) -> Option<f64> {
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return None;
    }

    const SUFFIXES: &[(&str, f64)] = &[
        ("Ki", 1024.0),
        ("Mi", 1_048_576.0),
        ("Gi", 1_073_741_824.0),
        ("Ti", 1_099_511_627_776.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
        ("m", 1e-3),
    ];

    for (suffix, factor) in SUFFIXES {
        if let Some(number) = quantity.strip_suffix(suffix) {
            return number.parse::<f64>().ok().map(|n| n * factor);
        }
    }

    quantity.parse::<f64>().ok()
}

/// Format bytes as a human readable binary size
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, zone: &str) -> WizardNode {
        WizardNode {
            name: name.to_string(),
            host_name: name.to_string(),
            cpu: 16.0,
            memory: 64 << 30,
            zone: zone.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_quantity_binary_and_decimal() {
        assert_eq!(parse_quantity("32Gi"), Some(34_359_738_368.0));
        assert_eq!(parse_quantity("16386412Ki"), Some(16_386_412.0 * 1024.0));
        assert_eq!(parse_quantity("2G"), Some(2e9));
        assert_eq!(parse_quantity("8"), Some(8.0));
        assert_eq!(parse_quantity("500m"), Some(0.5));
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("abc"), None);
    }

    #[test]
    fn test_totals() {
        let nodes = vec![node("a", "z1"), node("b", "z2")];
        assert_eq!(total_cpu(&nodes), 32.0);
        assert_eq!(total_memory(&nodes), 128 << 30);
    }

    #[test]
    fn test_flexible_scaling_when_fewer_than_three_zones() {
        let nodes = vec![node("a", "z1"), node("b", "z1"), node("c", "z2")];
        assert!(is_flexible_scaling(&nodes, false));
        assert!(!is_flexible_scaling(&nodes, true));

        let spread = vec![node("a", "z1"), node("b", "z2"), node("c", "z3")];
        assert!(!is_flexible_scaling(&spread, false));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1 << 30), "1.0 GiB");
        assert_eq!(format_bytes(3 << 40), "3.0 TiB");
    }

    #[test]
    fn test_taint_display() {
        assert_eq!(
            NodeTaint::storage().to_string(),
            "node.ocs.openshift.io/storage=true:NoSchedule"
        );
    }
}
