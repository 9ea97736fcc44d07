//! Answers files for non-interactive runs
//!
//! An answers file lists wizard actions by tag, in the same JSON shape the
//! actions serialize to, plus the names of the nodes to use:
//!
//! ```yaml
//! nodes: [worker-0, worker-1, worker-2]
//! actions:
//!   - type: wizard/setStorageClass
//!     payload: { name: gp3-csi, provisioner: ebs.csi.aws.com }
//!   - type: capacityAndNodes/capacity
//!     payload: 2Ti
//! ```

use crate::action::Action;
use crate::error::CoreError;
use crate::node::WizardNode;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Answers {
    /// Node names, resolved against the cluster inventory
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,
}

impl Answers {
    pub fn from_yaml(content: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Decode every action; the first unknown tag fails the whole file
    pub fn actions(&self) -> Result<Vec<Action>, CoreError> {
        self.actions.iter().cloned().map(Action::from_json).collect()
    }

    /// Look up the named nodes in the inventory, keeping the file's order
    pub fn resolve_nodes(&self, inventory: &[WizardNode]) -> Result<Vec<WizardNode>, CoreError> {
        self.nodes
            .iter()
            .map(|name| {
                inventory
                    .iter()
                    .find(|n| &n.name == name)
                    .cloned()
                    .ok_or_else(|| CoreError::UnknownNode(name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackingStorageType;
    use std::io::Write;

    const ANSWERS: &str = r#"
nodes: [worker-1, worker-0]
actions:
  - type: backingStorage/setType
    payload: EXISTING
  - type: wizard/setStorageClass
    payload: { name: gp3-csi, provisioner: ebs.csi.aws.com }
  - type: capacityAndNodes/capacity
    payload: 2Ti
"#;

    fn inventory() -> Vec<WizardNode> {
        ["worker-0", "worker-1", "worker-2"]
            .iter()
            .map(|name| WizardNode {
                name: name.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_actions_decode() {
        let answers = Answers::from_yaml(ANSWERS).unwrap();
        let actions = answers.actions().unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            Action::SetBackingStorageType(BackingStorageType::Existing)
        );
        assert_eq!(actions[2], Action::SetCapacity(Some("2Ti".to_string())));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let answers = Answers::from_yaml("actions:\n  - type: wizard/launchRockets\n    payload: true\n").unwrap();
        match answers.actions() {
            Err(CoreError::InvalidAction { tag, .. }) => assert_eq!(tag, "wizard/launchRockets"),
            other => panic!("expected invalid action, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_nodes() {
        let answers = Answers::from_yaml(ANSWERS).unwrap();
        let nodes = answers.resolve_nodes(&inventory()).unwrap();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["worker-1", "worker-0"]);

        let answers = Answers::from_yaml("nodes: [worker-9]").unwrap();
        assert!(matches!(
            answers.resolve_nodes(&inventory()),
            Err(CoreError::UnknownNode(name)) if name == "worker-9"
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", ANSWERS).unwrap();
        let answers = Answers::from_path(file.path()).unwrap();
        assert_eq!(answers.nodes.len(), 2);
    }
}
