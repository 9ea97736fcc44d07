//! Error types for storage-k8s

use thiserror::Error;

/// Errors raised while talking to the cluster
#[derive(Error, Debug)]
pub enum K8sError {
    /// Kubeconfig missing, unreadable, or without the requested context
    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("Failed to create K8s client: {0}")]
    ClientCreate(String),

    #[error("K8s API error: {0}")]
    Api(#[from] kube::Error),

    /// An object did not have the expected shape
    #[error("Failed to decode {kind}: {reason}")]
    Decode { kind: String, reason: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

impl K8sError {
    /// The API server answered 404 for the resource type or object
    pub fn is_not_found(&self) -> bool {
        matches!(self, K8sError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }
}
