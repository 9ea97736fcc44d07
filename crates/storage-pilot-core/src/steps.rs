//! Step sequencer
//!
//! The visible step list is derived from the state on every render, never
//! stored. Ids are positional, starting at 1 with the backing storage step.

use crate::provider::ProviderRegistry;
use crate::state::WizardState;
use crate::types::{BackingStorageType, DeploymentType, InfrastructureType};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    BackingStorage,
    CapacityAndNodes,
    SecurityAndNetwork,
    Security,
    CreateLocalVolumeSet,
    CreateStorageClass,
    ConnectionDetails,
    DataProtection,
    ReviewAndCreate,
}

impl StepName {
    pub fn title(&self) -> &'static str {
        match self {
            Self::BackingStorage => "Backing storage",
            Self::CapacityAndNodes => "Capacity and nodes",
            Self::SecurityAndNetwork => "Security and network",
            Self::Security => "Security",
            Self::CreateLocalVolumeSet => "Create local volume set",
            Self::CreateStorageClass => "Create storage class",
            Self::ConnectionDetails => "Connection details",
            Self::DataProtection => "Data protection",
            Self::ReviewAndCreate => "Review and create",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStep {
    pub id: u32,
    pub name: StepName,
    /// The step was reached before and may be revisited from the sidebar
    pub can_jump_to: bool,
}

/// Cluster facts the step list depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardContext {
    pub infrastructure: InfrastructureType,
    /// An internal storage cluster already exists
    pub has_storage_cluster: bool,
    /// An external-mode storage cluster already exists
    pub has_external_storage_cluster: bool,
    /// More than one managed cluster is registered with the hub
    pub has_multiple_clusters: bool,
}

/// How the chosen external platform shapes the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vendor {
    /// Internal mode, no platform involved
    Internal,
    Unselected,
    Default,
    ThirdParty,
    /// Third-party platform next to a storage cluster that already exists
    ThirdPartyAttached,
}

struct StepRow {
    backing: BackingStorageType,
    /// `None` matches every deployment
    deployment: Option<DeploymentType>,
    vendor: Vendor,
    steps: &'static [StepName],
}

/// Every flow the wizard can take. `DataProtection` is dropped from a row
/// unless several clusters are managed.
const STEP_TABLE: &[StepRow] = {
    use BackingStorageType::*;
    use StepName::*;
    &[
        StepRow {
            backing: Existing,
            deployment: Some(DeploymentType::Full),
            vendor: Vendor::Internal,
            steps: &[
                BackingStorage,
                CapacityAndNodes,
                SecurityAndNetwork,
                DataProtection,
                ReviewAndCreate,
            ],
        },
        StepRow {
            backing: Existing,
            deployment: Some(DeploymentType::Mcg),
            vendor: Vendor::Internal,
            steps: &[BackingStorage, CapacityAndNodes, Security, ReviewAndCreate],
        },
        StepRow {
            backing: LocalDevices,
            deployment: Some(DeploymentType::Full),
            vendor: Vendor::Internal,
            steps: &[
                BackingStorage,
                CreateLocalVolumeSet,
                CapacityAndNodes,
                SecurityAndNetwork,
                DataProtection,
                ReviewAndCreate,
            ],
        },
        StepRow {
            backing: LocalDevices,
            deployment: Some(DeploymentType::Mcg),
            vendor: Vendor::Internal,
            steps: &[
                BackingStorage,
                CreateLocalVolumeSet,
                CapacityAndNodes,
                Security,
                ReviewAndCreate,
            ],
        },
        StepRow {
            backing: External,
            deployment: None,
            vendor: Vendor::Default,
            steps: &[BackingStorage, ConnectionDetails, ReviewAndCreate],
        },
        StepRow {
            backing: External,
            deployment: None,
            vendor: Vendor::ThirdParty,
            steps: &[
                BackingStorage,
                CreateStorageClass,
                CapacityAndNodes,
                SecurityAndNetwork,
                ReviewAndCreate,
            ],
        },
        StepRow {
            backing: External,
            deployment: None,
            vendor: Vendor::ThirdPartyAttached,
            steps: &[BackingStorage, CreateStorageClass, ReviewAndCreate],
        },
        StepRow {
            backing: External,
            deployment: None,
            vendor: Vendor::Unselected,
            steps: &[BackingStorage, ReviewAndCreate],
        },
    ]
};

fn vendor(state: &WizardState, context: &WizardContext, registry: &ProviderRegistry) -> Vendor {
    if !state.is_external() {
        return Vendor::Internal;
    }
    match registry.selected(state) {
        None => Vendor::Unselected,
        Some(p) if ProviderRegistry::is_default_vendor(p.model().kind) => Vendor::Default,
        Some(_) if context.has_storage_cluster => Vendor::ThirdPartyAttached,
        Some(_) => Vendor::ThirdParty,
    }
}

fn lookup(
    backing: BackingStorageType,
    deployment: DeploymentType,
    vendor: Vendor,
) -> Option<&'static StepRow> {
    STEP_TABLE.iter().find(|row| {
        row.backing == backing
            && row.deployment.is_none_or(|d| d == deployment)
            && row.vendor == vendor
    })
}

fn step_names(
    state: &WizardState,
    context: &WizardContext,
    registry: &ProviderRegistry,
) -> Vec<StepName> {
    let backing = &state.backing_storage;
    let steps = lookup(backing.kind, backing.deployment, vendor(state, context, registry))
        .map_or(&[StepName::BackingStorage, StepName::ReviewAndCreate][..], |row| row.steps);
    steps
        .iter()
        .copied()
        .filter(|name| *name != StepName::DataProtection || context.has_multiple_clusters)
        .collect()
}

/// Ordered steps for the current state
pub fn compute_steps(
    state: &WizardState,
    context: &WizardContext,
    registry: &ProviderRegistry,
) -> Vec<WizardStep> {
    step_names(state, context, registry)
        .into_iter()
        .zip(1u32..)
        .map(|(name, id)| WizardStep {
            id,
            name,
            can_jump_to: id <= state.step_id_reached,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reduce;
    use crate::action::Action;
    use StepName::*;

    fn names(state: &WizardState, context: &WizardContext) -> Vec<StepName> {
        compute_steps(state, context, &ProviderRegistry::with_builtins())
            .into_iter()
            .map(|s| s.name)
            .collect()
    }

    fn with_type(kind: BackingStorageType) -> WizardState {
        reduce(&WizardState::initial(), Action::SetBackingStorageType(kind))
    }

    #[test]
    fn test_existing_full() {
        let state = WizardState::initial();
        let mut context = WizardContext::default();
        assert_eq!(
            names(&state, &context),
            vec![BackingStorage, CapacityAndNodes, SecurityAndNetwork, ReviewAndCreate]
        );

        context.has_multiple_clusters = true;
        assert_eq!(
            names(&state, &context),
            vec![
                BackingStorage,
                CapacityAndNodes,
                SecurityAndNetwork,
                DataProtection,
                ReviewAndCreate
            ]
        );
    }

    #[test]
    fn test_mcg_uses_security_step() {
        let state = reduce(
            &WizardState::initial(),
            Action::SetDeployment(DeploymentType::Mcg),
        );
        let context = WizardContext {
            has_multiple_clusters: true,
            ..Default::default()
        };
        assert_eq!(
            names(&state, &context),
            vec![BackingStorage, CapacityAndNodes, Security, ReviewAndCreate]
        );
    }

    #[test]
    fn test_local_devices_adds_volume_set_step() {
        let state = with_type(BackingStorageType::LocalDevices);
        assert_eq!(
            names(&state, &WizardContext::default()),
            vec![
                BackingStorage,
                CreateLocalVolumeSet,
                CapacityAndNodes,
                SecurityAndNetwork,
                ReviewAndCreate
            ]
        );
    }

    #[test]
    fn test_external_vendors() {
        let context = WizardContext::default();
        let state = with_type(BackingStorageType::External);
        assert_eq!(names(&state, &context), vec![BackingStorage, ReviewAndCreate]);

        let ceph = reduce(&state, Action::SetExternalStorage("StorageCluster".to_string()));
        assert_eq!(
            names(&ceph, &context),
            vec![BackingStorage, ConnectionDetails, ReviewAndCreate]
        );

        let flash = reduce(
            &state,
            Action::SetExternalStorage("FlashSystemCluster".to_string()),
        );
        assert_eq!(
            names(&flash, &context),
            vec![
                BackingStorage,
                CreateStorageClass,
                CapacityAndNodes,
                SecurityAndNetwork,
                ReviewAndCreate
            ]
        );

        let existing = WizardContext {
            has_storage_cluster: true,
            ..Default::default()
        };
        assert_eq!(
            names(&flash, &existing),
            vec![BackingStorage, CreateStorageClass, ReviewAndCreate]
        );
    }

    #[test]
    fn test_every_flow_has_exactly_one_row() {
        let vendors = [
            Vendor::Internal,
            Vendor::Unselected,
            Vendor::Default,
            Vendor::ThirdParty,
            Vendor::ThirdPartyAttached,
        ];
        for backing in [
            BackingStorageType::Existing,
            BackingStorageType::LocalDevices,
            BackingStorageType::External,
        ] {
            for deployment in [DeploymentType::Full, DeploymentType::Mcg] {
                for vendor in vendors {
                    let matches = STEP_TABLE
                        .iter()
                        .filter(|row| {
                            row.backing == backing
                                && row.deployment.is_none_or(|d| d == deployment)
                                && row.vendor == vendor
                        })
                        .count();
                    let internal = backing != BackingStorageType::External;
                    let expected = usize::from(internal == (vendor == Vendor::Internal));
                    assert_eq!(matches, expected, "{:?} {:?} {:?}", backing, deployment, vendor);
                }
            }
        }
    }

    #[test]
    fn test_table_rows_are_well_formed() {
        for row in STEP_TABLE {
            assert_eq!(row.steps.first(), Some(&BackingStorage));
            assert_eq!(row.steps.last(), Some(&ReviewAndCreate));
            let unique: std::collections::HashSet<_> = row.steps.iter().collect();
            assert_eq!(unique.len(), row.steps.len(), "{:?}", row.steps);
        }
    }

    #[test]
    fn test_ids_contiguous_and_jump_flags() {
        let mut state = WizardState::initial();
        state.step_id_reached = 2;
        let steps = compute_steps(
            &state,
            &WizardContext::default(),
            &ProviderRegistry::with_builtins(),
        );
        let ids: Vec<u32> = steps.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let jumps: Vec<bool> = steps.iter().map(|s| s.can_jump_to).collect();
        assert_eq!(jumps, vec![true, true, false, false]);
    }
}
