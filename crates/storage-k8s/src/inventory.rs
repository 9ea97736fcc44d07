//! Cluster inventory the wizard needs before it can render
//!
//! Everything is fetched concurrently and the load only succeeds when every
//! request does. Custom resources whose API is not installed load as empty.

use crate::api::api_resource;
use crate::error::K8sError;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, DynamicObject, ListParams};
use kube::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use storage_pilot_core::node::parse_quantity;
use storage_pilot_core::payload::{DiscoveredDevice, models};
use storage_pilot_core::{
    InfrastructureType, PilotConfig, ResourceModel, WizardContext, WizardNode, NodeTaint,
    HOSTNAME_LABEL, RACK_LABEL, ZONE_LABEL, ZONE_LABEL_LEGACY,
};

const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";
const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClassInfo {
    pub name: String,
    pub provisioner: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClusterSummary {
    pub name: String,
    pub external: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub nodes: Vec<WizardNode>,
    pub storage_classes: Vec<StorageClassInfo>,
    pub devices: Vec<DiscoveredDevice>,
    pub storage_clusters: Vec<StorageClusterSummary>,
    pub managed_clusters: usize,
    pub infrastructure: InfrastructureType,
}

impl Inventory {
    pub fn context(&self) -> WizardContext {
        WizardContext {
            infrastructure: self.infrastructure.clone(),
            has_storage_cluster: self.storage_clusters.iter().any(|c| !c.external),
            has_external_storage_cluster: self.storage_clusters.iter().any(|c| c.external),
            has_multiple_clusters: self.managed_clusters > 1,
        }
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    /// Storage classes a cluster can be built on, default class first
    pub fn usable_storage_classes(&self) -> Vec<&StorageClassInfo> {
        let mut classes: Vec<&StorageClassInfo> = self
            .storage_classes
            .iter()
            .filter(|c| c.provisioner != storage_pilot_core::NO_PROVISIONER)
            .collect();
        classes.sort_by_key(|c| (!c.is_default, c.name.clone()));
        classes
    }
}

/// Snapshot a cluster node for the wizard
pub fn wizard_node_from(node: &Node) -> WizardNode {
    let labels: BTreeMap<String, String> = node.metadata.labels.clone().unwrap_or_default();
    let capacity = node.status.as_ref().and_then(|s| s.capacity.as_ref());
    let quantity = |key: &str| {
        capacity
            .and_then(|c| c.get(key))
            .and_then(|q| parse_quantity(&q.0))
    };

    let zone = labels
        .get(ZONE_LABEL)
        .or_else(|| labels.get(ZONE_LABEL_LEGACY))
        .cloned()
        .unwrap_or_default();
    let roles = labels
        .keys()
        .filter_map(|k| k.strip_prefix(ROLE_LABEL_PREFIX))
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    let taints = node
        .spec
        .as_ref()
        .and_then(|s| s.taints.as_ref())
        .map(|taints| {
            taints
                .iter()
                .map(|t| NodeTaint {
                    key: t.key.clone(),
                    value: t.value.clone().unwrap_or_default(),
                    effect: t.effect.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    WizardNode {
        name: node.metadata.name.clone().unwrap_or_default(),
        host_name: labels.get(HOSTNAME_LABEL).cloned().unwrap_or_default(),
        cpu: quantity("cpu").unwrap_or(0.0),
        memory: quantity("memory").unwrap_or(0.0) as u64,
        zone,
        rack: labels.get(RACK_LABEL).cloned().unwrap_or_default(),
        uid: node.metadata.uid.clone().unwrap_or_default(),
        roles,
        labels,
        taints,
    }
}

fn storage_class_info(class: &StorageClass) -> StorageClassInfo {
    let is_default = class
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(DEFAULT_CLASS_ANNOTATION))
        .is_some_and(|v| v == "true");
    StorageClassInfo {
        name: class.metadata.name.clone().unwrap_or_default(),
        provisioner: class.provisioner.clone(),
        is_default,
    }
}

/// Devices of a `LocalVolumeDiscoveryResult`
pub fn devices_from_discovery(result: &Value) -> Vec<DiscoveredDevice> {
    let node = result
        .pointer("/spec/nodeName")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(devices) = result
        .pointer("/status/discoveredDevices")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    devices
        .iter()
        .map(|d| DiscoveredDevice {
            node: node.to_string(),
            path: d["path"].as_str().unwrap_or_default().to_string(),
            device_type: d["type"].as_str().unwrap_or_default().to_string(),
            size: d["size"].as_u64().unwrap_or(0),
            rotational: d["property"].as_str() == Some("Rotational"),
            status: d
                .pointer("/status/state")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn storage_cluster_summary(cluster: &Value) -> StorageClusterSummary {
    StorageClusterSummary {
        name: cluster
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        external: cluster
            .pointer("/spec/externalStorage/enable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

/// Platform from the `Infrastructure/cluster` status
pub fn platform_of(infrastructure: &Value) -> InfrastructureType {
    let platform = infrastructure
        .pointer("/status/platformStatus/type")
        .or_else(|| infrastructure.pointer("/status/platform"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    InfrastructureType::from_platform(platform)
}

fn to_value(object: &DynamicObject, kind: &str) -> Result<Value, K8sError> {
    serde_json::to_value(object).map_err(|e| K8sError::Decode {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

/// List a custom resource, treating an uninstalled API as empty
async fn list_optional(
    client: &Client,
    model: &ResourceModel,
    namespace: Option<&str>,
) -> Result<Vec<Value>, K8sError> {
    let resource = api_resource(model);
    let api: Api<DynamicObject> = match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &resource),
        None => Api::all_with(client.clone(), &resource),
    };
    match api.list(&ListParams::default()).await {
        Ok(list) => list.items.iter().map(|o| to_value(o, model.kind)).collect(),
        Err(e) => {
            let err = K8sError::from(e);
            if err.is_not_found() {
                tracing::debug!(kind = model.kind, "API not served, treating as empty");
                Ok(Vec::new())
            } else {
                Err(err)
            }
        }
    }
}

async fn list_nodes(client: &Client) -> Result<Vec<WizardNode>, K8sError> {
    let nodes: Api<Node> = Api::all(client.clone());
    let list = nodes.list(&ListParams::default()).await?;
    Ok(list.items.iter().map(wizard_node_from).collect())
}

async fn list_storage_classes(client: &Client) -> Result<Vec<StorageClassInfo>, K8sError> {
    let classes: Api<StorageClass> = Api::all(client.clone());
    let list = classes.list(&ListParams::default()).await?;
    Ok(list.items.iter().map(storage_class_info).collect())
}

async fn list_devices(client: &Client, namespace: &str) -> Result<Vec<DiscoveredDevice>, K8sError> {
    let results = list_optional(client, &models::LOCAL_VOLUME_DISCOVERY_RESULT, Some(namespace)).await?;
    Ok(results.iter().flat_map(devices_from_discovery).collect())
}

async fn list_storage_clusters(
    client: &Client,
    namespace: &str,
) -> Result<Vec<StorageClusterSummary>, K8sError> {
    let clusters = list_optional(client, &models::STORAGE_CLUSTER, Some(namespace)).await?;
    Ok(clusters.iter().map(storage_cluster_summary).collect())
}

async fn count_managed_clusters(client: &Client) -> Result<usize, K8sError> {
    Ok(list_optional(client, &models::MANAGED_CLUSTER, None).await?.len())
}

async fn infrastructure(client: &Client) -> Result<InfrastructureType, K8sError> {
    let infrastructures = list_optional(client, &models::INFRASTRUCTURE, None).await?;
    Ok(infrastructures
        .iter()
        .find(|i| i.pointer("/metadata/name").and_then(Value::as_str) == Some("cluster"))
        .map(platform_of)
        .unwrap_or_default())
}

/// Load the inventory; fails if any request fails
pub async fn load(client: &Client, config: &PilotConfig) -> Result<Inventory, K8sError> {
    let (nodes, storage_classes, devices, storage_clusters, managed_clusters, infrastructure) = tokio::try_join!(
        list_nodes(client),
        list_storage_classes(client),
        list_devices(client, &config.local_storage_namespace),
        list_storage_clusters(client, &config.namespace),
        count_managed_clusters(client),
        infrastructure(client),
    )?;

    tracing::info!(
        nodes = nodes.len(),
        storage_classes = storage_classes.len(),
        devices = devices.len(),
        storage_clusters = storage_clusters.len(),
        %infrastructure,
        "loaded cluster inventory"
    );

    Ok(Inventory {
        nodes,
        storage_classes,
        devices,
        storage_clusters,
        managed_clusters,
        infrastructure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeSpec, NodeStatus, Taint};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_wizard_node_from() {
        let mut capacity = BTreeMap::new();
        capacity.insert("cpu".to_string(), Quantity("16".to_string()));
        capacity.insert("memory".to_string(), Quantity("64Gi".to_string()));
        let node = Node {
            metadata: ObjectMeta {
                name: Some("worker-0".to_string()),
                uid: Some("uid-0".to_string()),
                labels: Some(labels(&[
                    ("kubernetes.io/hostname", "worker-0.example.com"),
                    ("failure-domain.beta.kubernetes.io/zone", "us-east-1a"),
                    ("node-role.kubernetes.io/worker", ""),
                ])),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints: Some(vec![Taint {
                    key: "node.ocs.openshift.io/storage".to_string(),
                    value: Some("true".to_string()),
                    effect: "NoSchedule".to_string(),
                    time_added: None,
                }]),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                capacity: Some(capacity),
                ..Default::default()
            }),
        };

        let snapshot = wizard_node_from(&node);
        assert_eq!(snapshot.name, "worker-0");
        assert_eq!(snapshot.host_name, "worker-0.example.com");
        assert_eq!(snapshot.zone, "us-east-1a");
        assert_eq!(snapshot.cpu, 16.0);
        assert_eq!(snapshot.memory, 64 << 30);
        assert_eq!(snapshot.roles, vec!["worker".to_string()]);
        assert_eq!(snapshot.taints, vec![NodeTaint::storage()]);
    }

    #[test]
    fn test_devices_from_discovery() {
        let result = json!({
            "spec": { "nodeName": "worker-1" },
            "status": { "discoveredDevices": [
                { "path": "/dev/sdb", "type": "disk", "size": 107374182400u64,
                  "property": "NonRotational", "status": { "state": "Available" } },
                { "path": "/dev/sda1", "type": "part", "size": 1024,
                  "property": "Rotational", "status": { "state": "NotAvailable" } }
            ]}
        });
        let devices = devices_from_discovery(&result);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].node, "worker-1");
        assert_eq!(devices[0].size, 100 << 30);
        assert!(!devices[0].rotational);
        assert_eq!(devices[0].status, "Available");
        assert!(devices[1].rotational);

        assert!(devices_from_discovery(&json!({ "spec": {} })).is_empty());
    }

    #[test]
    fn test_platform_of() {
        let infra = json!({ "status": { "platformStatus": { "type": "AWS" } } });
        assert_eq!(platform_of(&infra), InfrastructureType::Aws);
        let legacy = json!({ "status": { "platform": "BareMetal" } });
        assert_eq!(platform_of(&legacy), InfrastructureType::BareMetal);
        assert_eq!(platform_of(&json!({})), InfrastructureType::None);
    }

    #[test]
    fn test_context_from_inventory() {
        let inventory = Inventory {
            storage_clusters: vec![StorageClusterSummary {
                name: "ocs-external-storagecluster".to_string(),
                external: true,
            }],
            managed_clusters: 2,
            ..Default::default()
        };
        let context = inventory.context();
        assert!(!context.has_storage_cluster);
        assert!(context.has_external_storage_cluster);
        assert!(context.has_multiple_clusters);

        let cluster = json!({
            "metadata": { "name": "ocs-storagecluster" },
            "spec": {}
        });
        assert!(!storage_cluster_summary(&cluster).external);
    }

    #[test]
    fn test_usable_storage_classes_default_first() {
        let inventory = Inventory {
            storage_classes: vec![
                StorageClassInfo {
                    name: "a-local".to_string(),
                    provisioner: storage_pilot_core::NO_PROVISIONER.to_string(),
                    is_default: false,
                },
                StorageClassInfo {
                    name: "b-csi".to_string(),
                    provisioner: "ebs.csi.aws.com".to_string(),
                    is_default: false,
                },
                StorageClassInfo {
                    name: "gp3".to_string(),
                    provisioner: "ebs.csi.aws.com".to_string(),
                    is_default: true,
                },
            ],
            ..Default::default()
        };
        let names: Vec<&str> = inventory
            .usable_storage_classes()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["gp3", "b-csi"]);
    }
}
