//! Wizard driver
//!
//! Owns the state, the cluster context and the provider registry, and
//! implements the footer navigation (next, back, jump) on top of the step
//! sequencer and the gate.

use crate::action::{Action, LocalVolumeSetUpdate};
use crate::error::CoreError;
use crate::gate::{check_cluster, check_step};
use crate::payload::{DiscoveredDevice, matching_devices, matching_nodes};
use crate::provider::ProviderRegistry;
use crate::reducer::reduce;
use crate::state::{StorageClassSelection, WizardState};
use crate::steps::{StepName, WizardContext, WizardStep, compute_steps};
use crate::types::NO_PROVISIONER;

#[derive(Debug, Clone)]
pub struct Wizard {
    state: WizardState,
    context: WizardContext,
    registry: ProviderRegistry,
    /// Index of the current step in the step list
    current: usize,
}

impl Wizard {
    pub fn new(context: WizardContext, registry: ProviderRegistry) -> Self {
        Self {
            state: WizardState::initial(),
            context,
            registry,
            current: 0,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn context(&self) -> &WizardContext {
        &self.context
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn into_state(self) -> WizardState {
        self.state
    }

    /// Replace the cluster context after the inventory is (re)loaded
    pub fn set_context(&mut self, context: WizardContext) {
        self.context = context;
        self.clamp_current();
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action);
        self.clamp_current();
    }

    pub fn steps(&self) -> Vec<WizardStep> {
        compute_steps(&self.state, &self.context, &self.registry)
    }

    pub fn current_step(&self) -> WizardStep {
        let steps = self.steps();
        let index = self.current.min(steps.len().saturating_sub(1));
        steps[index]
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 >= self.steps().len()
    }

    /// The step's own gate, then its conflicts with the cluster
    fn check(&self, step: StepName) -> Result<(), String> {
        check_step(step, &self.state, &self.registry)?;
        check_cluster(step, &self.state, &self.context, &self.registry)
    }

    /// Why the current step cannot be left, if it cannot
    pub fn blocking_reason(&self) -> Option<String> {
        self.check(self.current_step().name).err()
    }

    pub fn can_go_next(&self) -> bool {
        !self.is_last_step() && self.check(self.current_step().name).is_ok()
    }

    /// Move to the following step, raising the reached high-water mark
    pub fn next(&mut self) -> Result<WizardStep, CoreError> {
        let step = self.current_step();
        self.check(step.name)
            .map_err(|reason| CoreError::StepIncomplete(format!("{}: {}", step.name, reason)))?;
        if self.is_last_step() {
            return Ok(step);
        }

        if step.name == StepName::CreateLocalVolumeSet {
            // The volume set provisions the storage class the cluster consumes
            let name = self.state.create_local_volume_set.volume_set_name.clone();
            self.dispatch(Action::SetStorageClass(StorageClassSelection {
                name,
                provisioner: NO_PROVISIONER.to_string(),
            }));
        }

        self.current += 1;
        self.clamp_current();
        let next = self.current_step();
        self.dispatch(Action::SetStepIdReached(next.id));
        tracing::info!(from = %step.name, to = %next.name, "wizard step");
        Ok(next)
    }

    pub fn back(&mut self) -> WizardStep {
        self.current = self.current.saturating_sub(1);
        self.current_step()
    }

    /// A step can be jumped to once reached, provided every step before it passes its gate
    pub fn can_jump_to(&self, id: u32) -> bool {
        let steps = self.steps();
        let Some(target) = steps.iter().find(|s| s.id == id) else {
            return false;
        };
        target.can_jump_to
            && steps
                .iter()
                .take_while(|s| s.id < id)
                .all(|s| self.check(s.name).is_ok())
    }

    pub fn jump_to(&mut self, id: u32) -> Result<WizardStep, CoreError> {
        if !self.can_jump_to(id) {
            return Err(CoreError::StepIncomplete(format!(
                "cannot jump to step {}",
                id
            )));
        }
        self.current = id.saturating_sub(1) as usize;
        Ok(self.current_step())
    }

    /// Recompute the nodes with matching disks and the local PV count
    pub fn refresh_local_volume_set(&mut self, all_nodes: &[String], devices: &[DiscoveredDevice]) {
        let lvs = &self.state.create_local_volume_set;
        let chart_nodes = matching_nodes(lvs, all_nodes, devices);
        let lvs = crate::state::CreateLocalVolumeSet {
            chart_nodes: chart_nodes.clone(),
            ..lvs.clone()
        };
        let pv_count = matching_devices(&lvs, devices).len() as u32;

        self.dispatch(Action::SetCreateLocalVolumeSet(
            LocalVolumeSetUpdate::ChartNodes(chart_nodes),
        ));
        self.dispatch(Action::SetPvCount(pv_count));
    }

    fn clamp_current(&mut self) {
        let len = self.steps().len();
        if self.current >= len {
            self.current = len.saturating_sub(1);
        }
    }
}
