//! StorageSystem payload

use super::{ObjectMeta, Payload, ResourceModel, models};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageSystem {
    pub metadata: ObjectMeta,
    pub spec: StorageSystemSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageSystemSpec {
    /// Name of the subsystem resource
    pub name: String,
    /// Subsystem kind, e.g. `storagecluster.ocs.openshift.io/v1`
    pub kind: String,
    pub namespace: String,
}

/// Record tying a subsystem resource to the storage system dashboard
pub fn storage_system_payload(
    subsystem_name: &str,
    subsystem: &ResourceModel,
    namespace: &str,
) -> Result<Payload, CoreError> {
    let system = StorageSystem {
        metadata: ObjectMeta::named(format!("{}-storagesystem", subsystem_name), namespace),
        spec: StorageSystemSpec {
            name: subsystem_name.to_string(),
            kind: subsystem.storage_system_kind(),
            namespace: namespace.to_string(),
        },
    };
    Payload::from_object(models::STORAGE_SYSTEM, Some(namespace), &system)
}
