//! storage-pilot configuration
//!
//! Read from `--config` or `<config dir>/storage-pilot/config.yaml`. A missing
//! file means defaults; command line flags override individual values.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PilotConfig {
    /// Namespace the storage operators run in
    pub namespace: String,
    pub storage_cluster_name: String,
    /// Name of the storage cluster created in external mode
    pub external_storage_cluster_name: String,
    /// Namespace of the local storage operator
    pub local_storage_namespace: String,
    /// Kubeconfig context, current context when unset
    pub kube_context: Option<String>,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            namespace: "openshift-storage".to_string(),
            storage_cluster_name: "ocs-storagecluster".to_string(),
            external_storage_cluster_name: "ocs-external-storagecluster".to_string(),
            local_storage_namespace: "openshift-local-storage".to_string(),
            kube_context: None,
        }
    }
}

impl PilotConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("storage-pilot").join("config.yaml"))
    }

    /// Load from an explicit path; the file must exist
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, CoreError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from `path` if given, otherwise from the default location when present
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        match path {
            Some(path) => Self::from_path(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    tracing::debug!("Loading config from {}", path.display());
                    Self::from_path(&path)
                }
                _ => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PilotConfig::default();
        assert_eq!(config.namespace, "openshift-storage");
        assert_eq!(config.storage_cluster_name, "ocs-storagecluster");
        assert_eq!(config.kube_context, None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PilotConfig::from_yaml("namespace: odf\nkubeContext: lab\n").unwrap();
        assert_eq!(config.namespace, "odf");
        assert_eq!(config.kube_context.as_deref(), Some("lab"));
        assert_eq!(config.local_storage_namespace, "openshift-local-storage");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(PilotConfig::from_yaml("  \n").unwrap(), PilotConfig::default());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storageClusterName: my-cluster").unwrap();
        let config = PilotConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.storage_cluster_name, "my-cluster");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = PilotConfig::load(Some(Path::new("/nonexistent/storage-pilot.yaml")));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        assert!(matches!(
            PilotConfig::from_yaml("namespace: [unclosed"),
            Err(CoreError::Yaml(_))
        ));
    }
}
