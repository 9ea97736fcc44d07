//! External Ceph cluster, the default vendor
//!
//! The user pastes the JSON produced by the exporter script on the Ceph side.
//! It is stored verbatim in a secret the operator reads on startup.

use super::{ExternalStorageProvider, FieldKind, FormField, PayloadArgs, ProviderStep};
use crate::config::PilotConfig;
use crate::error::CoreError;
use crate::payload::{
    ConnectionEncryption, Connections, NetworkSpec, ObjectMeta, Payload, ResourceModel,
    StorageCluster, StorageClusterSpec, Toggle, data_secret, models,
};
use crate::state::FormValues;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Secret the operator reads the exported cluster details from
pub const EXTERNAL_DETAILS_SECRET: &str = "rook-ceph-external-cluster-details";

/// Form field holding the exported JSON
pub const CLUSTER_DETAILS_FIELD: &str = "clusterDetails";

/// One exported resource
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportedResource {
    pub name: String,
    pub kind: String,
    pub data: serde_json::Value,
}

/// Parse and validate the exporter output
pub fn parse_cluster_details(raw: &str) -> Result<Vec<ExportedResource>, CoreError> {
    let resources: Vec<ExportedResource> = serde_json::from_str(raw)?;
    if resources.is_empty() {
        return Err(CoreError::Payload(
            "external cluster details are empty".to_string(),
        ));
    }
    Ok(resources)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalCephProvider;

impl ExternalStorageProvider for ExternalCephProvider {
    fn display_name(&self) -> &str {
        "Red Hat Ceph Storage"
    }

    fn model(&self) -> ResourceModel {
        models::STORAGE_CLUSTER
    }

    fn form_step(&self) -> ProviderStep {
        ProviderStep::ConnectionDetails
    }

    fn form(&self) -> Vec<FormField> {
        vec![FormField {
            id: CLUSTER_DETAILS_FIELD,
            label: "External storage system metadata (JSON)",
            kind: FieldKind::Json,
            required: true,
        }]
    }

    fn system_name(&self, _form: &FormValues, config: &PilotConfig) -> String {
        config.external_storage_cluster_name.clone()
    }

    fn create_payload(&self, args: &PayloadArgs<'_>) -> Result<Vec<Payload>, CoreError> {
        let raw = args
            .form
            .get(CLUSTER_DETAILS_FIELD)
            .map(String::as_str)
            .unwrap_or_default();
        parse_cluster_details(raw)?;

        let mut data = BTreeMap::new();
        data.insert("external_cluster_details".to_string(), raw.to_string());
        let secret = data_secret(EXTERNAL_DETAILS_SECRET, args.namespace, data)?;

        let cluster = StorageCluster {
            metadata: ObjectMeta::named(args.system_name, args.namespace),
            spec: StorageClusterSpec {
                external_storage: Some(Toggle { enable: true }),
                label_selector: Some(serde_json::json!({ "matchExpressions": [] })),
                network: args.in_transit_encryption.then(|| NetworkSpec {
                    connections: Connections {
                        encryption: ConnectionEncryption { enabled: true },
                    },
                    ..Default::default()
                }),
                ..Default::default()
            },
        };
        let cluster = Payload::from_object(models::STORAGE_CLUSTER, Some(args.namespace), &cluster)?;

        Ok(vec![secret, cluster])
    }

    fn can_go_to_next_step(&self, form: &FormValues, _storage_class_name: &str) -> bool {
        form.get(CLUSTER_DETAILS_FIELD)
            .is_some_and(|raw| parse_cluster_details(raw).is_ok())
    }
}
