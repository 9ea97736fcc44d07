//! REST payloads produced on submission
//!
//! Every object the wizard creates is a [`Payload`]: the API coordinates of
//! its kind plus a JSON body with the exact field names the platform expects.

mod kms;
mod local_volume_set;
mod postgres;
mod storage_cluster;
mod storage_system;

pub use kms::*;
pub use local_volume_set::*;
pub use postgres::*;
pub use storage_cluster::*;
pub use storage_system::*;

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API coordinates of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceModel {
    /// API group, empty for the core group
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,
}

impl ResourceModel {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Kind reference used by `StorageSystem.spec.kind`
    pub fn storage_system_kind(&self) -> String {
        format!(
            "{}.{}/{}",
            self.kind.to_lowercase(),
            self.group,
            self.version
        )
    }

    /// Name of the CustomResourceDefinition serving this kind
    pub fn crd_name(&self) -> String {
        format!("{}.{}", self.plural, self.group)
    }
}

/// Resource kinds the wizard creates
pub mod models {
    use super::ResourceModel;

    pub const SECRET: ResourceModel = ResourceModel {
        group: "",
        version: "v1",
        kind: "Secret",
        plural: "secrets",
        namespaced: true,
    };

    pub const CONFIG_MAP: ResourceModel = ResourceModel {
        group: "",
        version: "v1",
        kind: "ConfigMap",
        plural: "configmaps",
        namespaced: true,
    };

    pub const STORAGE_CLUSTER: ResourceModel = ResourceModel {
        group: "ocs.openshift.io",
        version: "v1",
        kind: "StorageCluster",
        plural: "storageclusters",
        namespaced: true,
    };

    pub const STORAGE_SYSTEM: ResourceModel = ResourceModel {
        group: "odf.openshift.io",
        version: "v1alpha1",
        kind: "StorageSystem",
        plural: "storagesystems",
        namespaced: true,
    };

    pub const LOCAL_VOLUME_SET: ResourceModel = ResourceModel {
        group: "local.storage.openshift.io",
        version: "v1alpha1",
        kind: "LocalVolumeSet",
        plural: "localvolumesets",
        namespaced: true,
    };

    pub const LOCAL_VOLUME_DISCOVERY_RESULT: ResourceModel = ResourceModel {
        group: "local.storage.openshift.io",
        version: "v1alpha1",
        kind: "LocalVolumeDiscoveryResult",
        plural: "localvolumediscoveryresults",
        namespaced: true,
    };

    pub const FLASH_SYSTEM_CLUSTER: ResourceModel = ResourceModel {
        group: "odf.ibm.com",
        version: "v1alpha1",
        kind: "FlashSystemCluster",
        plural: "flashsystemclusters",
        namespaced: true,
    };

    pub const MANAGED_CLUSTER: ResourceModel = ResourceModel {
        group: "cluster.open-cluster-management.io",
        version: "v1",
        kind: "ManagedCluster",
        plural: "managedclusters",
        namespaced: false,
    };

    pub const INFRASTRUCTURE: ResourceModel = ResourceModel {
        group: "config.openshift.io",
        version: "v1",
        kind: "Infrastructure",
        plural: "infrastructures",
        namespaced: false,
    };
}

/// Object metadata subset used by the payloads
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }
}

/// A resource to create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub model: ResourceModel,
    pub namespace: Option<String>,
    pub body: serde_json::Value,
}

impl Payload {
    /// Wrap a typed object, filling `apiVersion` and `kind` from the model
    pub fn from_object<T: Serialize>(
        model: ResourceModel,
        namespace: Option<&str>,
        object: &T,
    ) -> Result<Self, CoreError> {
        let mut body = serde_json::to_value(object)?;
        let Some(map) = body.as_object_mut() else {
            return Err(CoreError::Payload(format!(
                "{} body is not an object",
                model.kind
            )));
        };
        map.insert(
            "apiVersion".to_string(),
            serde_json::Value::String(model.api_version()),
        );
        map.insert(
            "kind".to_string(),
            serde_json::Value::String(model.kind.to_string()),
        );
        Ok(Self {
            model,
            namespace: namespace.map(str::to_string),
            body,
        })
    }

    pub fn name(&self) -> &str {
        self.body
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    /// Short description for logs and plans, e.g. `Secret/ocs-kms-token`
    pub fn describe(&self) -> String {
        format!("{}/{}", self.model.kind, self.name())
    }
}

/// An opaque secret with string data
pub fn string_secret(
    name: &str,
    namespace: &str,
    string_data: BTreeMap<String, String>,
) -> Result<Payload, CoreError> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Secret {
        metadata: ObjectMeta,
        #[serde(rename = "type")]
        kind: &'static str,
        string_data: BTreeMap<String, String>,
    }

    Payload::from_object(
        models::SECRET,
        Some(namespace),
        &Secret {
            metadata: ObjectMeta::named(name, namespace),
            kind: "Opaque",
            string_data,
        },
    )
}

/// An opaque secret whose values are base64 encoded into `data`
pub fn data_secret(
    name: &str,
    namespace: &str,
    data: BTreeMap<String, String>,
) -> Result<Payload, CoreError> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[derive(Serialize)]
    struct Secret {
        metadata: ObjectMeta,
        #[serde(rename = "type")]
        kind: &'static str,
        data: BTreeMap<String, String>,
    }

    let data = data
        .into_iter()
        .map(|(k, v)| (k, STANDARD.encode(v.as_bytes())))
        .collect();

    Payload::from_object(
        models::SECRET,
        Some(namespace),
        &Secret {
            metadata: ObjectMeta::named(name, namespace),
            kind: "Opaque",
            data,
        },
    )
}

/// A config map
pub fn config_map(
    name: &str,
    namespace: &str,
    data: BTreeMap<String, String>,
) -> Result<Payload, CoreError> {
    #[derive(Serialize)]
    struct ConfigMap {
        metadata: ObjectMeta,
        data: BTreeMap<String, String>,
    }

    Payload::from_object(
        models::CONFIG_MAP,
        Some(namespace),
        &ConfigMap {
            metadata: ObjectMeta::named(name, namespace),
            data,
        },
    )
}
