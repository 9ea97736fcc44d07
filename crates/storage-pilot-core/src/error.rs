//! Error types for storage-pilot-core

use thiserror::Error;

/// Errors raised by the wizard core
#[derive(Error, Debug)]
pub enum CoreError {
    /// Action with an unknown tag or a malformed payload
    #[error("Invalid action {tag}: {reason}")]
    InvalidAction { tag: String, reason: String },

    /// Failed to read a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to encode or decode JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No external storage provider is registered for a kind
    #[error("Unknown external storage provider: {0}")]
    UnknownProvider(String),

    /// A node named in an answers file is not part of the cluster
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The wizard cannot leave a step because its gate is closed
    #[error("Step \"{0}\" is incomplete")]
    StepIncomplete(String),

    /// The choices clash with storage already running in the cluster
    #[error("Conflicts with the cluster: {0}")]
    ClusterConflict(String),

    /// A payload could not be built from the wizard state
    #[error("Cannot build payload: {0}")]
    Payload(String),

    /// A certificate or key could not be parsed
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// A bucket policy or CORS document is invalid
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
