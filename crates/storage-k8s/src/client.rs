//! Kubernetes client construction

use crate::error::K8sError;
use kube::config::KubeConfigOptions;
use kube::{Client, Config};

/// Create a client for a kubeconfig context.
///
/// Without a context the usual inference applies: `KUBECONFIG`, then
/// `~/.kube/config`, then the in-cluster service account.
pub async fn create_client(context: Option<&str>) -> Result<Client, K8sError> {
    // Install crypto provider (needed for rustls)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options)
                .await
                .map_err(|e| K8sError::Kubeconfig(e.to_string()))?
        }
        None => Config::infer()
            .await
            .map_err(|e| K8sError::Kubeconfig(e.to_string()))?,
    };

    tracing::debug!(cluster_url = %config.cluster_url, "creating K8s client");
    Client::try_from(config).map_err(|e| K8sError::ClientCreate(e.to_string()))
}
