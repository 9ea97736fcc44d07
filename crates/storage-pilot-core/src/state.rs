//! Wizard state
//!
//! A single aggregate record holding everything the wizard collects. The
//! reducer is the only writer; every other module reads it.

use crate::node::WizardNode;
use crate::types::{
    BackingStorageType, DeploymentType, DeviceType, DiskMode, DiskSizeUnit, DiskType, KmsProvider,
    NetworkType, ResourceProfile, VaultAuthMethod,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Vendor-owned form values, keyed by field id
pub type FormValues = BTreeMap<String, String>;

/// The storage class the cluster will consume
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageClassSelection {
    pub name: String,
    pub provisioner: String,
}

impl StorageClassSelection {
    pub fn no_provisioner() -> Self {
        Self {
            name: String::new(),
            provisioner: crate::types::NO_PROVISIONER.to_string(),
        }
    }

    pub fn is_no_provisioner(&self) -> bool {
        self.provisioner == crate::types::NO_PROVISIONER
    }
}

/// Client certificate material for the external Postgres connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostgresKeys {
    /// PEM private key
    pub private: Option<String>,
    /// PEM certificate
    pub public: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresTls {
    pub enabled: bool,
    pub allow_self_signed_certs: bool,
    pub enable_client_side_certs: bool,
    pub keys: PostgresKeys,
}

/// External Postgres used by the object gateway instead of its own database
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPostgres {
    pub username: String,
    pub password: String,
    pub server_name: String,
    pub port: String,
    pub database_name: String,
    pub tls: PostgresTls,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackingStorage {
    #[serde(rename = "type")]
    pub kind: BackingStorageType,
    pub deployment: DeploymentType,
    /// Kind of the chosen external vendor, empty when none
    pub external_storage: String,
    #[serde(rename = "enableNFS")]
    pub enable_nfs: bool,
    #[serde(rename = "isRBDStorageClassDefault")]
    pub is_rbd_storage_class_default: bool,
    pub use_external_postgres: bool,
    pub external_postgres: ExternalPostgres,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityAndNodes {
    /// Requested OSD size, e.g. `2Ti`
    pub capacity: Option<String>,
    /// Number of local PVs available to the cluster
    pub pv_count: u32,
    pub enable_arbiter: bool,
    pub arbiter_location: String,
    pub enable_taint: bool,
    pub resource_profile: ResourceProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocalVolumeSet {
    pub volume_set_name: String,
    pub disk_type: DiskType,
    pub disk_mode: DiskMode,
    pub device_type: Vec<DeviceType>,
    pub min_disk_size: u64,
    /// Blank means no upper bound
    pub max_disk_size: String,
    pub disk_size_unit: DiskSizeUnit,
    /// Blank means all matching disks
    pub max_disk_limit: String,
    pub lvs_is_select_nodes: bool,
    pub lvs_select_nodes: Vec<String>,
    /// Nodes that have at least one disk matching the filter
    pub chart_nodes: BTreeSet<String>,
}

impl Default for CreateLocalVolumeSet {
    fn default() -> Self {
        Self {
            volume_set_name: String::new(),
            disk_type: DiskType::default(),
            disk_mode: DiskMode::default(),
            device_type: vec![DeviceType::Disk, DeviceType::Part],
            min_disk_size: 1,
            max_disk_size: String::new(),
            disk_size_unit: DiskSizeUnit::default(),
            max_disk_limit: String::new(),
            lvs_is_select_nodes: false,
            lvs_select_nodes: Vec::new(),
            chart_nodes: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encryption {
    pub in_transit: bool,
    pub cluster_wide: bool,
    pub storage_class: bool,
    /// Use an external key management service
    pub advanced: bool,
    /// The encryption sub-form was visited and resolved
    pub has_handled: bool,
}

impl Encryption {
    /// Keys come from the external KMS and something is encrypted with them
    pub fn uses_kms(&self) -> bool {
        self.advanced && (self.cluster_wide || self.storage_class)
    }
}

impl Default for Encryption {
    fn default() -> Self {
        Self {
            in_transit: false,
            cluster_wide: false,
            storage_class: false,
            advanced: false,
            has_handled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    pub name: String,
    pub address: String,
    pub port: String,
    pub auth_method: VaultAuthMethod,
    pub token: String,
    /// Kubernetes auth role
    pub role: String,
    pub backend: String,
    pub tls_server_name: String,
    pub provider_namespace: String,
    pub ca_cert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KmipConfig {
    pub name: String,
    pub address: String,
    pub port: String,
    pub tls_server_name: String,
    pub unique_identifier: String,
    pub client_ca: String,
    pub client_cert: String,
    pub client_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kms {
    pub provider: KmsProvider,
    pub vault: VaultConfig,
    pub kmip: KmipConfig,
    pub has_handled: bool,
}

impl Kms {
    /// Every connection detail the selected backend needs is filled in
    pub fn is_complete(&self) -> bool {
        let filled = |values: &[&String]| values.iter().all(|v| !v.trim().is_empty());
        match self.provider {
            KmsProvider::Vault => {
                let vault = &self.vault;
                let credential = match vault.auth_method {
                    VaultAuthMethod::Token => &vault.token,
                    VaultAuthMethod::Kubernetes => &vault.role,
                };
                filled(&[&vault.name, &vault.address, credential])
            }
            KmsProvider::Kmip => {
                let kmip = &self.kmip;
                filled(&[
                    &kmip.name,
                    &kmip.address,
                    &kmip.port,
                    &kmip.unique_identifier,
                    &kmip.client_ca,
                    &kmip.client_cert,
                    &kmip.client_key,
                ])
            }
        }
    }
}

impl Default for Kms {
    fn default() -> Self {
        Self {
            provider: KmsProvider::default(),
            vault: VaultConfig::default(),
            kmip: KmipConfig::default(),
            has_handled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAndNetwork {
    pub encryption: Encryption,
    pub kms: Kms,
    pub network_type: NetworkType,
    /// Multus attachment as `namespace/name`
    pub public_network: Option<String>,
    pub cluster_network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtection {
    pub enable_rdr_preparation: bool,
}

/// Everything the wizard collects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    /// Highest step id the user has reached
    pub step_id_reached: u32,
    pub storage_class: StorageClassSelection,
    pub nodes: Vec<WizardNode>,
    pub backing_storage: BackingStorage,
    pub capacity_and_nodes: CapacityAndNodes,
    pub create_storage_class: FormValues,
    pub connection_details: FormValues,
    pub create_local_volume_set: CreateLocalVolumeSet,
    pub security_and_network: SecurityAndNetwork,
    pub data_protection: DataProtection,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::initial()
    }
}

impl WizardState {
    pub fn initial() -> Self {
        Self {
            step_id_reached: 1,
            storage_class: StorageClassSelection::default(),
            nodes: Vec::new(),
            backing_storage: BackingStorage::default(),
            capacity_and_nodes: CapacityAndNodes::default(),
            create_storage_class: FormValues::new(),
            connection_details: FormValues::new(),
            create_local_volume_set: CreateLocalVolumeSet::default(),
            security_and_network: SecurityAndNetwork::default(),
            data_protection: DataProtection::default(),
        }
    }

    pub fn is_mcg(&self) -> bool {
        self.backing_storage.deployment == DeploymentType::Mcg
    }

    pub fn is_external(&self) -> bool {
        self.backing_storage.kind == BackingStorageType::External
    }

    /// The user has moved past the first step at least once
    pub fn has_progressed(&self) -> bool {
        self.step_id_reached > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = WizardState::initial();
        assert_eq!(state.step_id_reached, 1);
        assert!(!state.has_progressed());
        assert!(state.security_and_network.encryption.has_handled);
        assert!(state.security_and_network.kms.has_handled);
    }

    #[test]
    fn test_vault_completeness_follows_auth_method() {
        let mut kms = Kms::default();
        assert!(!kms.is_complete());

        kms.vault.name = "vault".to_string();
        kms.vault.address = "https://vault.example.com".to_string();
        kms.vault.token = "s.token".to_string();
        assert!(kms.is_complete());

        kms.vault.auth_method = VaultAuthMethod::Kubernetes;
        assert!(!kms.is_complete());
        kms.vault.role = "odf".to_string();
        assert!(kms.is_complete());
    }

    #[test]
    fn test_kmip_needs_client_material() {
        let mut kms = Kms {
            provider: KmsProvider::Kmip,
            ..Default::default()
        };
        kms.kmip.name = "kmip".to_string();
        kms.kmip.address = "kmip.example.com".to_string();
        kms.kmip.port = "5696".to_string();
        kms.kmip.unique_identifier = "id".to_string();
        assert!(!kms.is_complete());

        kms.kmip.client_ca = "ca".to_string();
        kms.kmip.client_cert = "cert".to_string();
        kms.kmip.client_key = "key".to_string();
        assert!(kms.is_complete());
    }
}
