//! [`ClusterApi`] backed by a kube client

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Node, Taint};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams, PostParams};
use kube::runtime::wait::{await_condition, conditions};
use kube::Client;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use storage_pilot_core::{ApiError, ClusterApi, NodeTaint, Payload, ResourceModel};

/// How long to wait for a provider's CRD to be established
pub const DEFAULT_CRD_TIMEOUT: Duration = Duration::from_secs(300);

/// API coordinates for the dynamic client
pub fn api_resource(model: &ResourceModel) -> ApiResource {
    ApiResource {
        group: model.group.to_string(),
        version: model.version.to_string(),
        api_version: model.api_version(),
        kind: model.kind.to_string(),
        plural: model.plural.to_string(),
    }
}

/// Keep the server's message for API errors, the full error otherwise
fn api_error(err: kube::Error) -> ApiError {
    match err {
        kube::Error::Api(resp) => ApiError(resp.message),
        other => ApiError(other.to_string()),
    }
}

fn to_taint(taint: &NodeTaint) -> Taint {
    Taint {
        key: taint.key.clone(),
        value: (!taint.value.is_empty()).then(|| taint.value.clone()),
        effect: taint.effect.clone(),
        time_added: None,
    }
}

/// Node taints with `taint` added, or `None` when already present
pub fn with_taint(existing: &[Taint], taint: &NodeTaint) -> Option<Vec<Taint>> {
    let present = existing
        .iter()
        .any(|t| t.key == taint.key && t.effect == taint.effect);
    if present {
        return None;
    }
    let mut taints = existing.to_vec();
    taints.push(to_taint(taint));
    Some(taints)
}

#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
    crd_timeout: Duration,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            crd_timeout: DEFAULT_CRD_TIMEOUT,
        }
    }

    pub fn with_crd_timeout(mut self, timeout: Duration) -> Self {
        self.crd_timeout = timeout;
        self
    }

    fn dynamic_api(&self, model: &ResourceModel, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = api_resource(model);
        match namespace {
            Some(ns) if model.namespaced => Api::namespaced_with(self.client.clone(), ns, &resource),
            _ => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn ensure_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        match namespaces.create(&PostParams::default(), &namespace).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 409 => {
                tracing::debug!(namespace = name, "namespace exists, merging labels");
                let patch = json!({ "metadata": { "labels": labels } });
                namespaces
                    .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
                    .map(|_| ())
                    .map_err(api_error)
            }
            Err(e) => Err(api_error(e)),
        }
    }

    async fn label_node(
        &self,
        node: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let patch = json!({ "metadata": { "labels": labels } });
        nodes
            .patch(node, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn taint_node(&self, node: &str, taint: &NodeTaint) -> Result<(), ApiError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let current = nodes.get(node).await.map_err(api_error)?;
        let existing = current
            .spec
            .as_ref()
            .and_then(|s| s.taints.clone())
            .unwrap_or_default();

        let Some(taints) = with_taint(&existing, taint) else {
            tracing::debug!(node, %taint, "taint already present");
            return Ok(());
        };
        let patch = json!({ "spec": { "taints": taints } });
        nodes
            .patch(node, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn create(&self, payload: &Payload) -> Result<(), ApiError> {
        let object: DynamicObject = serde_json::from_value(payload.body.clone())
            .map_err(|e| ApiError(format!("invalid {} body: {}", payload.model.kind, e)))?;
        let api = self.dynamic_api(&payload.model, payload.namespace.as_deref());
        api.create(&PostParams::default(), &object)
            .await
            .map(|_| ())
            .map_err(api_error)
    }

    async fn wait_for_crd(&self, name: &str) -> Result<(), ApiError> {
        let crds: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let established = await_condition(crds, name, conditions::is_crd_established());
        match tokio::time::timeout(self.crd_timeout, established).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ApiError(e.to_string())),
            Err(_) => Err(ApiError(format!(
                "timed out after {}s waiting for {}",
                self.crd_timeout.as_secs(),
                name
            ))),
        }
    }
}
