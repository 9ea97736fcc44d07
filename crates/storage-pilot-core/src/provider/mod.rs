//! External storage providers
//!
//! The extension point for vendor flows. A provider owns a sub-form (its
//! field descriptors stand in for a UI component), validates it, and turns it
//! into payloads. Providers are registered explicitly in a
//! [`ProviderRegistry`] at startup; the wizard core only calls the trait.

mod external_ceph;
mod flashsystem;

pub use external_ceph::ExternalCephProvider;
pub use flashsystem::FlashSystemProvider;

use crate::config::PilotConfig;
use crate::error::CoreError;
use crate::payload::{Payload, ResourceModel};
use crate::state::{FormValues, WizardState};
use crate::submit::{ApiError, ClusterApi};
use async_trait::async_trait;
use std::sync::Arc;

/// Kind of the default external vendor (an external Ceph cluster)
pub const DEFAULT_EXTERNAL_KIND: &str = "StorageCluster";

/// Which wizard step hosts the provider's sub-form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStep {
    CreateStorageClass,
    ConnectionDetails,
}

/// How a form field is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Masked input
    Secret,
    /// One of a fixed set of values
    Choice(&'static [&'static str]),
    /// Multi-line JSON document
    Json,
}

/// Descriptor of one input of a provider sub-form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Values a provider receives to build its payloads
#[derive(Debug, Clone)]
pub struct PayloadArgs<'a> {
    pub system_name: &'a str,
    pub namespace: &'a str,
    pub storage_class_name: &'a str,
    pub form: &'a FormValues,
    pub in_transit_encryption: bool,
}

#[async_trait]
pub trait ExternalStorageProvider: Send + Sync {
    fn display_name(&self) -> &str;

    /// Kind of the subsystem resource this provider creates
    fn model(&self) -> ResourceModel;

    fn form_step(&self) -> ProviderStep;

    fn form(&self) -> Vec<FormField>;

    /// CSI provisioner of the storage class the provider creates, if any
    fn provisioner(&self) -> Option<&str> {
        None
    }

    /// Name of the subsystem resource
    fn system_name(&self, form: &FormValues, config: &PilotConfig) -> String;

    fn create_payload(&self, args: &PayloadArgs<'_>) -> Result<Vec<Payload>, CoreError>;

    fn can_go_to_next_step(&self, form: &FormValues, storage_class_name: &str) -> bool;

    /// Whether [`wait_to_create`](Self::wait_to_create) must run before the payloads are created
    fn waits_to_create(&self) -> bool {
        false
    }

    async fn wait_to_create(&self, _api: &dyn ClusterApi) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Registered providers, looked up by resource kind
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ExternalStorageProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.model().kind))
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the in-tree providers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ExternalCephProvider));
        registry.register(Arc::new(FlashSystemProvider));
        registry
    }

    /// Register a provider; a later registration for the same kind replaces the earlier one
    pub fn register(&mut self, provider: Arc<dyn ExternalStorageProvider>) {
        let kind = provider.model().kind;
        self.providers.retain(|p| p.model().kind != kind);
        tracing::debug!(kind, "registered external storage provider");
        self.providers.push(provider);
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ExternalStorageProvider>> {
        self.providers.iter().find(|p| p.model().kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ExternalStorageProvider>> {
        self.providers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn is_default_vendor(kind: &str) -> bool {
        kind == DEFAULT_EXTERNAL_KIND
    }

    /// Provider chosen in the wizard state, if any
    pub fn selected(&self, state: &WizardState) -> Option<&Arc<dyn ExternalStorageProvider>> {
        if !state.is_external() {
            return None;
        }
        self.get(&state.backing_storage.external_storage)
    }
}

/// The form values a provider edits, by its step
pub fn form_values(state: &WizardState, step: ProviderStep) -> &FormValues {
    match step {
        ProviderStep::CreateStorageClass => &state.create_storage_class,
        ProviderStep::ConnectionDetails => &state.connection_details,
    }
}

/// Every required field has a non-blank value
pub fn required_fields_present(fields: &[FormField], form: &FormValues) -> bool {
    fields
        .iter()
        .filter(|f| f.required)
        .all(|f| form.get(f.id).is_some_and(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackingStorageType;

    #[test]
    fn test_builtins_registered() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.get("StorageCluster").is_some());
        assert!(registry.get("FlashSystemCluster").is_some());
        assert!(registry.get("Unknown").is_none());
        assert!(ProviderRegistry::is_default_vendor("StorageCluster"));
        assert!(!ProviderRegistry::is_default_vendor("FlashSystemCluster"));
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = ProviderRegistry::with_builtins();
        registry.register(Arc::new(FlashSystemProvider));
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn test_selected_only_for_external() {
        let registry = ProviderRegistry::with_builtins();
        let mut state = WizardState::initial();
        state.backing_storage.external_storage = "FlashSystemCluster".to_string();
        assert!(registry.selected(&state).is_none());
        state.backing_storage.kind = BackingStorageType::External;
        assert!(registry.selected(&state).is_some());
    }

    #[test]
    fn test_required_fields_present() {
        let fields = [
            FormField {
                id: "a",
                label: "A",
                kind: FieldKind::Text,
                required: true,
            },
            FormField {
                id: "b",
                label: "B",
                kind: FieldKind::Text,
                required: false,
            },
        ];
        let mut form = FormValues::new();
        assert!(!required_fields_present(&fields, &form));
        form.insert("a".to_string(), "  ".to_string());
        assert!(!required_fields_present(&fields, &form));
        form.insert("a".to_string(), "x".to_string());
        assert!(required_fields_present(&fields, &form));
    }
}
