//! Submission
//!
//! [`plan_submission`] turns the final wizard state into an ordered list of
//! operations and [`execute`] runs them one at a time against a
//! [`ClusterApi`]. The first failure stops execution; operations that already
//! succeeded stay applied.

use crate::config::PilotConfig;
use crate::error::CoreError;
use crate::node::NodeTaint;
use crate::payload::{
    Payload, ResourceModel, external_postgres_payloads, kms_payloads, local_volume_set_payload,
    models, storage_cluster_payload, storage_system_payload,
};
use crate::provider::{PayloadArgs, ProviderRegistry, form_values};
use crate::state::WizardState;
use crate::gate::check_cluster;
use crate::steps::{WizardContext, compute_steps};
use crate::types::{BackingStorageType, STORAGE_NODE_LABEL};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Label enabling cluster monitoring for the storage namespace
pub const CLUSTER_MONITORING_LABEL: &str = "openshift.io/cluster-monitoring";

/// Raw failure reported by the cluster
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ApiError(pub String);

/// Operations the wizard performs against the cluster
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Create the namespace if missing and merge the labels into it
    async fn ensure_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError>;

    async fn label_node(&self, node: &str, labels: &BTreeMap<String, String>)
    -> Result<(), ApiError>;

    /// Add a taint unless the node already carries it
    async fn taint_node(&self, node: &str, taint: &NodeTaint) -> Result<(), ApiError>;

    async fn create(&self, payload: &Payload) -> Result<(), ApiError>;

    /// Wait until a CustomResourceDefinition is established
    async fn wait_for_crd(&self, name: &str) -> Result<(), ApiError>;
}

/// One step of a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    EnsureNamespace {
        name: String,
        labels: BTreeMap<String, String>,
    },
    LabelNode {
        node: String,
        labels: BTreeMap<String, String>,
    },
    TaintNode {
        node: String,
        taint: NodeTaint,
    },
    Create {
        payload: Payload,
    },
    /// Run the provider's readiness hook
    WaitForProvider {
        kind: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::EnsureNamespace { name, .. } => write!(f, "ensure namespace {}", name),
            Operation::LabelNode { node, .. } => write!(f, "label node {}", node),
            Operation::TaintNode { node, taint } => write!(f, "taint node {} with {}", node, taint),
            Operation::Create { payload } => write!(f, "create {}", payload.describe()),
            Operation::WaitForProvider { kind } => write!(f, "wait for {} API", kind),
        }
    }
}

/// Ordered operations of a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionPlan {
    pub operations: Vec<Operation>,
}

impl SubmissionPlan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Payloads in creation order
    pub fn payloads(&self) -> impl Iterator<Item = &Payload> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Create { payload } => Some(payload),
            _ => None,
        })
    }

    fn create_all(&mut self, payloads: Vec<Payload>) {
        self.operations
            .extend(payloads.into_iter().map(|payload| Operation::Create { payload }));
    }
}

/// A failed operation; everything before `index` was applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("operation {index} ({operation}) failed: {source}")]
pub struct SubmitError {
    pub index: usize,
    pub operation: String,
    pub source: ApiError,
}

/// Build the operations for the final state
pub fn plan_submission(
    state: &WizardState,
    context: &WizardContext,
    registry: &ProviderRegistry,
    config: &PilotConfig,
) -> Result<SubmissionPlan, CoreError> {
    for step in compute_steps(state, context, registry) {
        check_cluster(step.name, state, context, registry).map_err(CoreError::ClusterConflict)?;
    }

    let namespace = config.namespace.as_str();
    let mut plan = SubmissionPlan::default();

    let provider = if state.is_external() {
        let kind = &state.backing_storage.external_storage;
        Some(
            registry
                .get(kind)
                .ok_or_else(|| CoreError::UnknownProvider(kind.clone()))?,
        )
    } else {
        None
    };
    let default_vendor =
        provider.is_some_and(|p| ProviderRegistry::is_default_vendor(p.model().kind));
    // Internal mode, or a third-party vendor whose storage class backs a new cluster
    let creates_storage_cluster =
        provider.is_none() || (!default_vendor && !context.has_storage_cluster);

    let mut monitoring = BTreeMap::new();
    monitoring.insert(CLUSTER_MONITORING_LABEL.to_string(), "true".to_string());
    plan.operations.push(Operation::EnsureNamespace {
        name: namespace.to_string(),
        labels: monitoring,
    });

    if creates_storage_cluster {
        let mut storage_label = BTreeMap::new();
        storage_label.insert(STORAGE_NODE_LABEL.to_string(), String::new());
        for node in &state.nodes {
            plan.operations.push(Operation::LabelNode {
                node: node.name.clone(),
                labels: storage_label.clone(),
            });
        }
        if state.capacity_and_nodes.enable_taint {
            for node in &state.nodes {
                plan.operations.push(Operation::TaintNode {
                    node: node.name.clone(),
                    taint: NodeTaint::storage(),
                });
            }
        }

        let security = &state.security_and_network;
        if security.encryption.uses_kms() && !state.is_mcg() {
            plan.create_all(kms_payloads(&security.kms, namespace)?);
        }
        if state.backing_storage.use_external_postgres {
            plan.create_all(external_postgres_payloads(
                &state.backing_storage.external_postgres,
                namespace,
            )?);
        }
        if state.backing_storage.kind == BackingStorageType::LocalDevices {
            plan.create_all(vec![local_volume_set_payload(
                &state.create_local_volume_set,
                &config.local_storage_namespace,
            )?]);
        }
    }

    let (system_name, system_model): (String, ResourceModel) = match provider {
        Some(p) => (
            p.system_name(form_values(state, p.form_step()), config),
            p.model(),
        ),
        None => (config.storage_cluster_name.clone(), models::STORAGE_CLUSTER),
    };
    plan.create_all(vec![storage_system_payload(
        &system_name,
        &system_model,
        namespace,
    )?]);

    if creates_storage_cluster {
        plan.create_all(vec![storage_cluster_payload(state, config)?]);
    }

    if let Some(p) = provider {
        if p.waits_to_create() {
            plan.operations.push(Operation::WaitForProvider {
                kind: p.model().kind.to_string(),
            });
        }
        let payloads = p.create_payload(&PayloadArgs {
            system_name: &system_name,
            namespace,
            storage_class_name: &state.storage_class.name,
            form: form_values(state, p.form_step()),
            in_transit_encryption: state.security_and_network.encryption.in_transit,
        })?;
        plan.create_all(payloads);
    }

    tracing::debug!(operations = plan.len(), "planned submission");
    Ok(plan)
}

/// Run a plan, stopping at the first failure
pub async fn execute(
    plan: &SubmissionPlan,
    api: &dyn ClusterApi,
    registry: &ProviderRegistry,
) -> Result<(), SubmitError> {
    execute_with_progress(plan, api, registry, |_, _| {}).await
}

/// Run a plan, reporting each operation before it starts
pub async fn execute_with_progress<F>(
    plan: &SubmissionPlan,
    api: &dyn ClusterApi,
    registry: &ProviderRegistry,
    mut progress: F,
) -> Result<(), SubmitError>
where
    F: FnMut(usize, &Operation) + Send,
{
    for (index, operation) in plan.operations.iter().enumerate() {
        progress(index, operation);
        tracing::info!(index, "{}", operation);

        let result = match operation {
            Operation::EnsureNamespace { name, labels } => api.ensure_namespace(name, labels).await,
            Operation::LabelNode { node, labels } => api.label_node(node, labels).await,
            Operation::TaintNode { node, taint } => api.taint_node(node, taint).await,
            Operation::Create { payload } => api.create(payload).await,
            Operation::WaitForProvider { kind } => match registry.get(kind) {
                Some(provider) => provider.wait_to_create(api).await,
                None => Err(ApiError(format!("no provider registered for {}", kind))),
            },
        };

        if let Err(source) = result {
            tracing::error!(index, error = %source, "{} failed", operation);
            return Err(SubmitError {
                index,
                operation: operation.to_string(),
                source,
            });
        }
    }
    Ok(())
}
