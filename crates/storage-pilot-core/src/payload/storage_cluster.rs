//! StorageCluster payload

use super::{ObjectMeta, Payload, models};
use crate::config::PilotConfig;
use crate::error::CoreError;
use crate::node::is_flexible_scaling;
use crate::state::WizardState;
use crate::types::NetworkType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation preparing a cluster to be a Regional-DR target
pub const RDR_ANNOTATION: &str = "ocs.openshift.io/clusterIsDisasterRecoveryTarget";

/// Secret holding the external Postgres connection string
pub const EXTERNAL_PG_SECRET: &str = "noobaa-external-pg";

/// Secret holding the external Postgres client certificate
pub const EXTERNAL_PG_TLS_SECRET: &str = "noobaa-external-pg-tls";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCluster {
    pub metadata: ObjectMeta,
    pub spec: StorageClusterSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter: Option<Arbiter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_topologies: Option<NodeTopologies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_nodes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible_scaling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon_data_dir_host_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_resources: Option<ManagedResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfs: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_device_sets: Option<Vec<StorageDeviceSet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_cloud_gateway: Option<MultiCloudGateway>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_storage: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<serde_json::Value>,
}

/// `{enable: bool}` blocks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toggle {
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Arbiter {
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTopologies {
    pub arbiter_location: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResources {
    pub ceph_block_pools: CephBlockPools,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CephBlockPools {
    pub default_storage_class: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionSpec {
    pub enable: bool,
    pub cluster_wide: bool,
    pub storage_class: bool,
    pub kms: Toggle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub connections: Connections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Connections {
    pub encryption: ConnectionEncryption,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionEncryption {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiCloudGateway {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_storage_class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_pg_config: Option<ExternalPgConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPgConfig {
    pub pg_secret_name: String,
    pub allow_self_signed_certs: bool,
    pub enable_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_secret_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDeviceSet {
    pub name: String,
    pub count: u32,
    pub portable: bool,
    pub replica: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub placement: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "dataPVCTemplate")]
    pub data_pvc_template: DataPvcTemplate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPvcTemplate {
    pub spec: PvcSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    pub storage_class_name: String,
    pub access_modes: Vec<String>,
    pub volume_mode: String,
    pub resources: PvcResources,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PvcResources {
    pub requests: BTreeMap<String, String>,
}

/// Replicas per device set: 4 for stretch clusters, 1 with flexible scaling
pub fn device_set_replica(stretch: bool, flexible_scaling: bool) -> u32 {
    if stretch {
        4
    } else if flexible_scaling {
        1
    } else {
        3
    }
}

/// Number of device sets
pub fn device_set_count(
    no_provisioner: bool,
    flexible_scaling: bool,
    pv_count: u32,
    replica: u32,
) -> u32 {
    if no_provisioner {
        (pv_count / replica).max(1)
    } else if flexible_scaling {
        3
    } else {
        1
    }
}

fn device_set(
    storage_class: &str,
    osd_size: &str,
    portable: bool,
    replica: u32,
    count: u32,
) -> StorageDeviceSet {
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), osd_size.to_string());

    StorageDeviceSet {
        name: format!("ocs-deviceset-{}", storage_class),
        count,
        portable,
        replica,
        resources: BTreeMap::new(),
        placement: BTreeMap::new(),
        data_pvc_template: DataPvcTemplate {
            spec: PvcSpec {
                storage_class_name: storage_class.to_string(),
                access_modes: vec!["ReadWriteOnce".to_string()],
                volume_mode: "Block".to_string(),
                resources: PvcResources { requests },
            },
        },
    }
}

fn external_pg_config(state: &WizardState) -> Option<ExternalPgConfig> {
    if !state.backing_storage.use_external_postgres {
        return None;
    }
    let tls = &state.backing_storage.external_postgres.tls;
    Some(ExternalPgConfig {
        pg_secret_name: EXTERNAL_PG_SECRET.to_string(),
        allow_self_signed_certs: tls.enabled && tls.allow_self_signed_certs,
        enable_tls: tls.enabled,
        tls_secret_name: (tls.enabled && tls.enable_client_side_certs)
            .then(|| EXTERNAL_PG_TLS_SECRET.to_string()),
    })
}

/// Build the storage cluster object for an internal (or vendor-backed) deployment
pub fn storage_cluster(state: &WizardState, config: &PilotConfig) -> Result<StorageCluster, CoreError> {
    let mut metadata = ObjectMeta::named(&config.storage_cluster_name, &config.namespace);
    let storage_class = &state.storage_class;
    let pg_config = external_pg_config(state);

    if state.is_mcg() {
        return Ok(StorageCluster {
            metadata,
            spec: StorageClusterSpec {
                multi_cloud_gateway: Some(MultiCloudGateway {
                    reconcile_strategy: Some("standalone".to_string()),
                    db_storage_class_name: (!storage_class.name.is_empty())
                        .then(|| storage_class.name.clone()),
                    external_pg_config: pg_config,
                }),
                ..Default::default()
            },
        });
    }

    if storage_class.name.is_empty() {
        return Err(CoreError::Payload("no storage class selected".to_string()));
    }

    let capacity_and_nodes = &state.capacity_and_nodes;
    let no_provisioner = storage_class.is_no_provisioner();
    let osd_size = if no_provisioner {
        "1".to_string()
    } else {
        capacity_and_nodes
            .capacity
            .clone()
            .ok_or_else(|| CoreError::Payload("no capacity selected".to_string()))?
    };

    let stretch = capacity_and_nodes.enable_arbiter;
    let flexible_scaling = is_flexible_scaling(&state.nodes, stretch);
    let replica = device_set_replica(stretch, flexible_scaling);
    let count = device_set_count(
        no_provisioner,
        flexible_scaling,
        capacity_and_nodes.pv_count,
        replica,
    );
    let portable = !flexible_scaling && !no_provisioner;

    let security = &state.security_and_network;
    let encryption = &security.encryption;
    let kms_enabled = encryption.uses_kms();

    let mut network = NetworkSpec {
        connections: Connections {
            encryption: ConnectionEncryption {
                enabled: encryption.in_transit,
            },
        },
        ..Default::default()
    };
    if security.network_type == NetworkType::Multus {
        network.provider = Some("multus".to_string());
        if let Some(public) = &security.public_network {
            network.selectors.insert("public".to_string(), public.clone());
        }
        if let Some(cluster) = &security.cluster_network {
            network.selectors.insert("cluster".to_string(), cluster.clone());
        }
    }

    if state.data_protection.enable_rdr_preparation {
        metadata
            .annotations
            .insert(RDR_ANNOTATION.to_string(), "true".to_string());
    }

    Ok(StorageCluster {
        metadata,
        spec: StorageClusterSpec {
            arbiter: stretch.then_some(Arbiter { enable: true }),
            node_topologies: stretch.then(|| NodeTopologies {
                arbiter_location: capacity_and_nodes.arbiter_location.clone(),
            }),
            manage_nodes: Some(false),
            resource_profile: Some(capacity_and_nodes.resource_profile.as_str().to_string()),
            flexible_scaling: Some(flexible_scaling),
            mon_data_dir_host_path: no_provisioner.then(|| "/var/lib/rook".to_string()),
            managed_resources: Some(ManagedResources {
                ceph_block_pools: CephBlockPools {
                    default_storage_class: state.backing_storage.is_rbd_storage_class_default,
                },
            }),
            encryption: Some(EncryptionSpec {
                enable: encryption.cluster_wide,
                cluster_wide: encryption.cluster_wide,
                storage_class: encryption.storage_class,
                kms: Toggle {
                    enable: kms_enabled,
                },
            }),
            network: Some(network),
            nfs: state
                .backing_storage
                .enable_nfs
                .then_some(Toggle { enable: true }),
            storage_device_sets: Some(vec![device_set(
                &storage_class.name,
                &osd_size,
                portable,
                replica,
                count,
            )]),
            multi_cloud_gateway: pg_config.map(|pg| MultiCloudGateway {
                external_pg_config: Some(pg),
                ..Default::default()
            }),
            ..Default::default()
        },
    })
}

/// Storage cluster payload
pub fn storage_cluster_payload(state: &WizardState, config: &PilotConfig) -> Result<Payload, CoreError> {
    let cluster = storage_cluster(state, config)?;
    Payload::from_object(models::STORAGE_CLUSTER, Some(&config.namespace), &cluster)
}
