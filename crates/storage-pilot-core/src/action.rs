//! Wizard actions
//!
//! Every action carries a dotted `domain/verb` tag. The tag doubles as the
//! serialized `type` field so answers files can replay actions verbatim.

use crate::error::CoreError;
use crate::node::WizardNode;
use crate::state::{Encryption, Kms, PostgresKeys, StorageClassSelection};
use crate::types::{
    BackingStorageType, DeploymentType, DeviceType, DiskSizeUnit, DiskType, NetworkType,
    ResourceProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single vendor form field update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Update of one field of the local volume set form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum LocalVolumeSetUpdate {
    VolumeSetName(String),
    DiskType(DiskType),
    DeviceType(Vec<DeviceType>),
    MinDiskSize(u64),
    MaxDiskSize(String),
    DiskSizeUnit(DiskSizeUnit),
    MaxDiskLimit(String),
    LvsIsSelectNodes(bool),
    LvsSelectNodes(Vec<String>),
    ChartNodes(BTreeSet<String>),
}

/// Closed set of wizard state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "wizard/setStepIdReached")]
    SetStepIdReached(u32),
    #[serde(rename = "wizard/setStorageClass")]
    SetStorageClass(StorageClassSelection),
    #[serde(rename = "wizard/nodes")]
    SetNodes(Vec<WizardNode>),
    #[serde(rename = "wizard/setCreateStorageClass")]
    SetCreateStorageClass(FieldUpdate),
    #[serde(rename = "wizard/setConnectionDetails")]
    SetConnectionDetails(FieldUpdate),
    #[serde(rename = "wizard/setCreateLocalVolumeSet")]
    SetCreateLocalVolumeSet(LocalVolumeSetUpdate),

    #[serde(rename = "backingStorage/setType")]
    SetBackingStorageType(BackingStorageType),
    #[serde(rename = "backingStorage/setDeployment")]
    SetDeployment(DeploymentType),
    #[serde(rename = "backingStorage/enableNFS")]
    EnableNfs(bool),
    #[serde(rename = "backingStorage/setRBDStorageClassDefault")]
    SetRbdStorageClassDefault(bool),
    #[serde(rename = "backingStorage/setExternalStorage")]
    SetExternalStorage(String),
    #[serde(rename = "backingStorage/useExternalPostgres")]
    UseExternalPostgres(bool),
    #[serde(rename = "backingStorage/externalPostgres/setUsername")]
    SetPostgresUsername(String),
    #[serde(rename = "backingStorage/externalPostgres/setPassword")]
    SetPostgresPassword(String),
    #[serde(rename = "backingStorage/externalPostgres/setServerName")]
    SetPostgresServerName(String),
    #[serde(rename = "backingStorage/externalPostgres/setPort")]
    SetPostgresPort(String),
    #[serde(rename = "backingStorage/externalPostgres/setDatabaseName")]
    SetPostgresDatabaseName(String),
    #[serde(rename = "backingStorage/externalPostgres/setTls")]
    SetPostgresTls(bool),
    #[serde(rename = "backingStorage/externalPostgres/setAllowSelfSignedCerts")]
    SetPostgresAllowSelfSignedCerts(bool),
    #[serde(rename = "backingStorage/externalPostgres/setEnableClientSideCerts")]
    SetPostgresEnableClientSideCerts(bool),
    #[serde(rename = "backingStorage/externalPostgres/setKeys")]
    SetPostgresKeys(PostgresKeys),

    #[serde(rename = "capacityAndNodes/capacity")]
    SetCapacity(Option<String>),
    #[serde(rename = "capacityAndNodes/pvCount")]
    SetPvCount(u32),
    #[serde(rename = "capacityAndNodes/enableArbiter")]
    EnableArbiter(bool),
    #[serde(rename = "capacityAndNodes/arbiterLocation")]
    SetArbiterLocation(String),
    #[serde(rename = "capacityAndNodes/enableTaint")]
    EnableTaint(bool),
    #[serde(rename = "capacityAndNodes/setResourceProfile")]
    SetResourceProfile(ResourceProfile),

    #[serde(rename = "securityAndNetwork/setEncryption")]
    SetEncryption(Encryption),
    #[serde(rename = "securityAndNetwork/setKms")]
    SetKms(Kms),
    #[serde(rename = "securityAndNetwork/setNetworkType")]
    SetNetworkType(NetworkType),
    #[serde(rename = "securityAndNetwork/setPublicNetwork")]
    SetPublicNetwork(Option<String>),
    #[serde(rename = "securityAndNetwork/setClusterNetwork")]
    SetClusterNetwork(Option<String>),

    #[serde(rename = "dataProtection/enableRdrPreparation")]
    EnableRdrPreparation(bool),
}

impl Action {
    /// The dotted tag of this action
    pub fn tag(&self) -> &'static str {
        match self {
            Action::SetStepIdReached(_) => "wizard/setStepIdReached",
            Action::SetStorageClass(_) => "wizard/setStorageClass",
            Action::SetNodes(_) => "wizard/nodes",
            Action::SetCreateStorageClass(_) => "wizard/setCreateStorageClass",
            Action::SetConnectionDetails(_) => "wizard/setConnectionDetails",
            Action::SetCreateLocalVolumeSet(_) => "wizard/setCreateLocalVolumeSet",
            Action::SetBackingStorageType(_) => "backingStorage/setType",
            Action::SetDeployment(_) => "backingStorage/setDeployment",
            Action::EnableNfs(_) => "backingStorage/enableNFS",
            Action::SetRbdStorageClassDefault(_) => "backingStorage/setRBDStorageClassDefault",
            Action::SetExternalStorage(_) => "backingStorage/setExternalStorage",
            Action::UseExternalPostgres(_) => "backingStorage/useExternalPostgres",
            Action::SetPostgresUsername(_) => "backingStorage/externalPostgres/setUsername",
            Action::SetPostgresPassword(_) => "backingStorage/externalPostgres/setPassword",
            Action::SetPostgresServerName(_) => "backingStorage/externalPostgres/setServerName",
            Action::SetPostgresPort(_) => "backingStorage/externalPostgres/setPort",
            Action::SetPostgresDatabaseName(_) => {
                "backingStorage/externalPostgres/setDatabaseName"
            }
            Action::SetPostgresTls(_) => "backingStorage/externalPostgres/setTls",
            Action::SetPostgresAllowSelfSignedCerts(_) => {
                "backingStorage/externalPostgres/setAllowSelfSignedCerts"
            }
            Action::SetPostgresEnableClientSideCerts(_) => {
                "backingStorage/externalPostgres/setEnableClientSideCerts"
            }
            Action::SetPostgresKeys(_) => "backingStorage/externalPostgres/setKeys",
            Action::SetCapacity(_) => "capacityAndNodes/capacity",
            Action::SetPvCount(_) => "capacityAndNodes/pvCount",
            Action::EnableArbiter(_) => "capacityAndNodes/enableArbiter",
            Action::SetArbiterLocation(_) => "capacityAndNodes/arbiterLocation",
            Action::EnableTaint(_) => "capacityAndNodes/enableTaint",
            Action::SetResourceProfile(_) => "capacityAndNodes/setResourceProfile",
            Action::SetEncryption(_) => "securityAndNetwork/setEncryption",
            Action::SetKms(_) => "securityAndNetwork/setKms",
            Action::SetNetworkType(_) => "securityAndNetwork/setNetworkType",
            Action::SetPublicNetwork(_) => "securityAndNetwork/setPublicNetwork",
            Action::SetClusterNetwork(_) => "securityAndNetwork/setClusterNetwork",
            Action::EnableRdrPreparation(_) => "dataProtection/enableRdrPreparation",
        }
    }

    /// Decode an action from its JSON form.
    ///
    /// Unknown tags are rejected; they can only come from outside the program.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("<missing>")
            .to_string();
        serde_json::from_value(value).map_err(|e| CoreError::InvalidAction {
            tag,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
