//! IBM FlashSystem
//!
//! Creates a storage class backed by a FlashSystem pool. The custom resource
//! is served by an operator that is installed alongside the wizard, so its
//! definition must be established before the cluster object can be created.

use super::{ExternalStorageProvider, FieldKind, FormField, PayloadArgs, ProviderStep};
use crate::config::PilotConfig;
use crate::error::CoreError;
use crate::payload::{ObjectMeta, Payload, ResourceModel, models, string_secret};
use crate::state::FormValues;
use crate::submit::{ApiError, ClusterApi};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Secret holding the management credentials
pub const FLASH_SYSTEM_SECRET: &str = "ibm-flashsystem-storage";

pub const FLASH_SYSTEM_PROVISIONER: &str = "block.csi.ibm.com";

const VOLUME_MODES: &[&str] = &["thick", "thin"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlashSystemCluster {
    metadata: ObjectMeta,
    spec: FlashSystemClusterSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlashSystemClusterSpec {
    name: String,
    insecure_skip_verify: bool,
    secret: SecretRef,
    default_pool: DefaultPool,
}

#[derive(Serialize)]
struct SecretRef {
    name: String,
    namespace: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultPool {
    pool_name: String,
    storageclass_name: String,
    space_efficiency: String,
    fs_type: &'static str,
    volume_name_prefix: &'static str,
}

fn field<'a>(form: &'a FormValues, id: &str) -> &'a str {
    form.get(id).map(|v| v.trim()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlashSystemProvider;

#[async_trait]
impl ExternalStorageProvider for FlashSystemProvider {
    fn display_name(&self) -> &str {
        "IBM FlashSystem Storage"
    }

    fn model(&self) -> ResourceModel {
        models::FLASH_SYSTEM_CLUSTER
    }

    fn form_step(&self) -> ProviderStep {
        ProviderStep::CreateStorageClass
    }

    fn form(&self) -> Vec<FormField> {
        vec![
            FormField {
                id: "name",
                label: "Storage system name",
                kind: FieldKind::Text,
                required: true,
            },
            FormField {
                id: "endpoint",
                label: "IP address",
                kind: FieldKind::Text,
                required: true,
            },
            FormField {
                id: "username",
                label: "Username",
                kind: FieldKind::Text,
                required: true,
            },
            FormField {
                id: "password",
                label: "Password",
                kind: FieldKind::Secret,
                required: true,
            },
            FormField {
                id: "poolname",
                label: "Pool name",
                kind: FieldKind::Text,
                required: true,
            },
            FormField {
                id: "volumeMode",
                label: "Volume mode",
                kind: FieldKind::Choice(VOLUME_MODES),
                required: true,
            },
        ]
    }

    fn provisioner(&self) -> Option<&str> {
        Some(FLASH_SYSTEM_PROVISIONER)
    }

    fn system_name(&self, form: &FormValues, _config: &PilotConfig) -> String {
        field(form, "name").to_string()
    }

    fn create_payload(&self, args: &PayloadArgs<'_>) -> Result<Vec<Payload>, CoreError> {
        let form = args.form;

        let mut credentials = BTreeMap::new();
        credentials.insert(
            "management_address".to_string(),
            field(form, "endpoint").to_string(),
        );
        credentials.insert("username".to_string(), field(form, "username").to_string());
        credentials.insert("password".to_string(), field(form, "password").to_string());
        let secret = string_secret(FLASH_SYSTEM_SECRET, args.namespace, credentials)?;

        let cluster = FlashSystemCluster {
            metadata: ObjectMeta::named(args.system_name, args.namespace),
            spec: FlashSystemClusterSpec {
                name: args.system_name.to_string(),
                insecure_skip_verify: true,
                secret: SecretRef {
                    name: FLASH_SYSTEM_SECRET.to_string(),
                    namespace: args.namespace.to_string(),
                },
                default_pool: DefaultPool {
                    pool_name: field(form, "poolname").to_string(),
                    storageclass_name: args.storage_class_name.to_string(),
                    space_efficiency: field(form, "volumeMode").to_string(),
                    fs_type: "ext4",
                    volume_name_prefix: "odf",
                },
            },
        };
        let cluster = Payload::from_object(self.model(), Some(args.namespace), &cluster)?;

        Ok(vec![secret, cluster])
    }

    fn can_go_to_next_step(&self, form: &FormValues, storage_class_name: &str) -> bool {
        super::required_fields_present(&self.form(), form)
            && field(form, "endpoint").starts_with("https://")
            && VOLUME_MODES.contains(&field(form, "volumeMode"))
            && !storage_class_name.trim().is_empty()
    }

    fn waits_to_create(&self) -> bool {
        true
    }

    async fn wait_to_create(&self, api: &dyn ClusterApi) -> Result<(), ApiError> {
        api.wait_for_crd(&self.model().crd_name()).await
    }
}
