//! Wizard reducer
//!
//! `reduce` maps `(state, action)` to a new state without side effects. The
//! two mode switches (backing storage type and deployment type) go through
//! [`apply_mode_change`], which either resets dependent state or adjusts it in
//! place, then runs the consistency rules in [`NORMALIZERS`].

use crate::action::{Action, LocalVolumeSetUpdate};
use crate::state::{StorageClassSelection, WizardState};
use crate::types::{BackingStorageType, DeploymentType, NetworkType};

/// A change of one of the top-level choices other state depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    BackingStorageType(BackingStorageType),
    Deployment(DeploymentType),
}

/// Consistency rules run after every mode change. Each rule is idempotent.
const NORMALIZERS: &[(&str, fn(&mut WizardState))] = &[
    ("external-storage-only-for-external", clear_external_storage),
    ("storage-class-placeholder", normalize_storage_class),
    ("mcg-has-no-cluster-topology", clear_mcg_incompatible),
];

/// Apply an action to a copy of the state
pub fn reduce(state: &WizardState, action: Action) -> WizardState {
    tracing::debug!(action = action.tag(), "reduce");
    let mut next = state.clone();

    match action {
        Action::SetStepIdReached(id) => {
            next.step_id_reached = next.step_id_reached.max(id);
        }
        Action::SetStorageClass(storage_class) => next.storage_class = storage_class,
        Action::SetNodes(nodes) => next.nodes = nodes,
        Action::SetCreateStorageClass(update) => {
            next.create_storage_class.insert(update.field, update.value);
        }
        Action::SetConnectionDetails(update) => {
            next.connection_details.insert(update.field, update.value);
        }
        Action::SetCreateLocalVolumeSet(update) => {
            let lvs = &mut next.create_local_volume_set;
            match update {
                LocalVolumeSetUpdate::VolumeSetName(name) => lvs.volume_set_name = name,
                LocalVolumeSetUpdate::DiskType(disk_type) => lvs.disk_type = disk_type,
                LocalVolumeSetUpdate::DeviceType(device_type) => lvs.device_type = device_type,
                LocalVolumeSetUpdate::MinDiskSize(size) => lvs.min_disk_size = size,
                LocalVolumeSetUpdate::MaxDiskSize(size) => lvs.max_disk_size = size,
                LocalVolumeSetUpdate::DiskSizeUnit(unit) => lvs.disk_size_unit = unit,
                LocalVolumeSetUpdate::MaxDiskLimit(limit) => lvs.max_disk_limit = limit,
                LocalVolumeSetUpdate::LvsIsSelectNodes(select) => lvs.lvs_is_select_nodes = select,
                LocalVolumeSetUpdate::LvsSelectNodes(nodes) => lvs.lvs_select_nodes = nodes,
                LocalVolumeSetUpdate::ChartNodes(nodes) => lvs.chart_nodes = nodes,
            }
        }

        Action::SetBackingStorageType(kind) => {
            return apply_mode_change(&next, ModeChange::BackingStorageType(kind));
        }
        Action::SetDeployment(deployment) => {
            return apply_mode_change(&next, ModeChange::Deployment(deployment));
        }
        Action::EnableNfs(enable) => next.backing_storage.enable_nfs = enable,
        Action::SetRbdStorageClassDefault(default) => {
            next.backing_storage.is_rbd_storage_class_default = default;
        }
        Action::SetExternalStorage(kind) => next.backing_storage.external_storage = kind,
        Action::UseExternalPostgres(enable) => next.backing_storage.use_external_postgres = enable,
        Action::SetPostgresUsername(v) => next.backing_storage.external_postgres.username = v,
        Action::SetPostgresPassword(v) => next.backing_storage.external_postgres.password = v,
        Action::SetPostgresServerName(v) => next.backing_storage.external_postgres.server_name = v,
        Action::SetPostgresPort(v) => next.backing_storage.external_postgres.port = v,
        Action::SetPostgresDatabaseName(v) => {
            next.backing_storage.external_postgres.database_name = v;
        }
        Action::SetPostgresTls(v) => next.backing_storage.external_postgres.tls.enabled = v,
        Action::SetPostgresAllowSelfSignedCerts(v) => {
            next.backing_storage.external_postgres.tls.allow_self_signed_certs = v;
        }
        Action::SetPostgresEnableClientSideCerts(v) => {
            next.backing_storage.external_postgres.tls.enable_client_side_certs = v;
        }
        Action::SetPostgresKeys(keys) => next.backing_storage.external_postgres.tls.keys = keys,

        Action::SetCapacity(capacity) => next.capacity_and_nodes.capacity = capacity,
        Action::SetPvCount(count) => next.capacity_and_nodes.pv_count = count,
        Action::EnableArbiter(enable) => {
            next.capacity_and_nodes.enable_arbiter = enable;
            if !enable {
                next.capacity_and_nodes.arbiter_location.clear();
            }
        }
        Action::SetArbiterLocation(zone) => next.capacity_and_nodes.arbiter_location = zone,
        Action::EnableTaint(enable) => next.capacity_and_nodes.enable_taint = enable,
        Action::SetResourceProfile(profile) => next.capacity_and_nodes.resource_profile = profile,

        Action::SetEncryption(encryption) => next.security_and_network.encryption = encryption,
        Action::SetKms(kms) => next.security_and_network.kms = kms,
        Action::SetNetworkType(network_type) => {
            next.security_and_network.network_type = network_type;
        }
        Action::SetPublicNetwork(network) => next.security_and_network.public_network = network,
        Action::SetClusterNetwork(network) => next.security_and_network.cluster_network = network,

        Action::EnableRdrPreparation(enable) => {
            next.data_protection.enable_rdr_preparation = enable;
        }
    }

    next
}

/// Switch a top-level choice and bring dependent state back in line.
///
/// Once the user has moved past the first step every dependent slice is reset
/// to its initial value; before that the state is adjusted in place. The
/// step high-water mark is kept in both cases.
pub fn apply_mode_change(state: &WizardState, change: ModeChange) -> WizardState {
    let mut next = if state.has_progressed() {
        tracing::debug!(?change, "resetting dependent wizard state");
        let mut reset = WizardState::initial();
        reset.step_id_reached = state.step_id_reached;
        reset.backing_storage.kind = state.backing_storage.kind;
        set_mode(&mut reset, change);
        if reset.backing_storage.kind == BackingStorageType::Existing {
            reset.storage_class = state.storage_class.clone();
        }
        reset
    } else {
        let mut adjusted = state.clone();
        set_mode(&mut adjusted, change);
        adjusted
    };

    for (name, rule) in NORMALIZERS {
        tracing::trace!(rule = name, "normalize");
        rule(&mut next);
    }

    next
}

fn set_mode(state: &mut WizardState, change: ModeChange) {
    match change {
        ModeChange::BackingStorageType(kind) => state.backing_storage.kind = kind,
        ModeChange::Deployment(deployment) => state.backing_storage.deployment = deployment,
    }
}

fn clear_external_storage(state: &mut WizardState) {
    if state.backing_storage.kind != BackingStorageType::External {
        state.backing_storage.external_storage.clear();
    }
}

fn normalize_storage_class(state: &mut WizardState) {
    match state.backing_storage.kind {
        BackingStorageType::LocalDevices | BackingStorageType::External => {
            if !state.storage_class.is_no_provisioner() {
                state.storage_class = StorageClassSelection::no_provisioner();
            }
        }
        BackingStorageType::Existing => {
            if state.storage_class.is_no_provisioner() {
                state.storage_class = StorageClassSelection::default();
            }
        }
    }
}

fn clear_mcg_incompatible(state: &mut WizardState) {
    if state.backing_storage.deployment != DeploymentType::Mcg {
        return;
    }
    state.backing_storage.enable_nfs = false;
    state.backing_storage.is_rbd_storage_class_default = false;
    state.capacity_and_nodes.enable_arbiter = false;
    state.capacity_and_nodes.arbiter_location.clear();
    state.capacity_and_nodes.enable_taint = false;
    state.security_and_network.network_type = NetworkType::Default;
    state.security_and_network.public_network = None;
    state.security_and_network.cluster_network = None;
    state.security_and_network.encryption.in_transit = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::WizardNode;
    use crate::state::Encryption;
    use crate::types::NO_PROVISIONER;
    use proptest::prelude::*;

    fn dispatch_all(actions: Vec<Action>) -> WizardState {
        actions
            .into_iter()
            .fold(WizardState::initial(), |state, action| reduce(&state, action))
    }

    fn gp3() -> StorageClassSelection {
        StorageClassSelection {
            name: "gp3".to_string(),
            provisioner: "ebs.csi.aws.com".to_string(),
        }
    }

    #[test]
    fn test_step_id_reached_never_decreases() {
        let state = dispatch_all(vec![
            Action::SetStepIdReached(3),
            Action::SetStepIdReached(2),
        ]);
        assert_eq!(state.step_id_reached, 3);
    }

    #[test]
    fn test_switch_away_from_external_clears_vendor() {
        let state = dispatch_all(vec![
            Action::SetBackingStorageType(BackingStorageType::External),
            Action::SetExternalStorage("FlashSystemCluster".to_string()),
            Action::SetBackingStorageType(BackingStorageType::Existing),
        ]);
        assert_eq!(state.backing_storage.external_storage, "");
    }

    #[test]
    fn test_switch_to_local_devices_at_first_step_sets_placeholder_class() {
        let state = dispatch_all(vec![
            Action::SetStorageClass(gp3()),
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
        ]);
        assert_eq!(state.storage_class.name, "");
        assert_eq!(state.storage_class.provisioner, NO_PROVISIONER);
    }

    #[test]
    fn test_switch_to_external_at_first_step_keeps_other_fields() {
        let state = dispatch_all(vec![
            Action::EnableTaint(true),
            Action::SetBackingStorageType(BackingStorageType::External),
        ]);
        assert_eq!(state.storage_class, StorageClassSelection::no_provisioner());
        assert!(state.capacity_and_nodes.enable_taint);
    }

    #[test]
    fn test_switch_back_to_existing_clears_placeholder() {
        let state = dispatch_all(vec![
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
            Action::SetBackingStorageType(BackingStorageType::Existing),
        ]);
        assert_eq!(state.storage_class, StorageClassSelection::default());
    }

    #[test]
    fn test_type_change_after_progress_resets_dependent_state() {
        let state = dispatch_all(vec![
            Action::SetStorageClass(gp3()),
            Action::SetStepIdReached(3),
            Action::SetCapacity(Some("2Ti".to_string())),
            Action::SetNodes(vec![WizardNode::default()]),
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
        ]);
        assert_eq!(state.step_id_reached, 3);
        assert_eq!(state.backing_storage.kind, BackingStorageType::LocalDevices);
        assert_eq!(state.capacity_and_nodes.capacity, None);
        assert!(state.nodes.is_empty());
        assert_eq!(state.storage_class, StorageClassSelection::no_provisioner());
    }

    #[test]
    fn test_type_change_after_progress_restores_full_deployment() {
        let state = dispatch_all(vec![
            Action::SetDeployment(DeploymentType::Mcg),
            Action::SetStepIdReached(3),
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
        ]);
        assert_eq!(state.backing_storage.kind, BackingStorageType::LocalDevices);
        assert_eq!(state.backing_storage.deployment, DeploymentType::Full);
        assert_eq!(state.step_id_reached, 3);
    }

    #[test]
    fn test_type_change_before_progress_keeps_deployment() {
        let state = dispatch_all(vec![
            Action::SetDeployment(DeploymentType::Mcg),
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
        ]);
        assert_eq!(state.backing_storage.deployment, DeploymentType::Mcg);
    }

    #[test]
    fn test_type_change_to_existing_after_progress_keeps_storage_class() {
        let state = dispatch_all(vec![
            Action::SetStorageClass(gp3()),
            Action::SetStepIdReached(2),
            Action::SetBackingStorageType(BackingStorageType::Existing),
        ]);
        assert_eq!(state.storage_class, gp3());
    }

    #[test]
    fn test_switch_to_mcg_drops_arbiter_settings() {
        let state = dispatch_all(vec![
            Action::EnableArbiter(true),
            Action::SetArbiterLocation("zone-a".to_string()),
            Action::EnableNfs(true),
            Action::SetDeployment(DeploymentType::Mcg),
        ]);
        assert!(!state.capacity_and_nodes.enable_arbiter);
        assert_eq!(state.capacity_and_nodes.arbiter_location, "");
        assert!(!state.backing_storage.enable_nfs);
    }

    #[test]
    fn test_deployment_change_after_progress_resets_but_keeps_type() {
        let state = dispatch_all(vec![
            Action::SetBackingStorageType(BackingStorageType::LocalDevices),
            Action::SetStepIdReached(4),
            Action::SetEncryption(Encryption {
                cluster_wide: true,
                ..Default::default()
            }),
            Action::SetDeployment(DeploymentType::Mcg),
        ]);
        assert_eq!(state.backing_storage.kind, BackingStorageType::LocalDevices);
        assert_eq!(state.backing_storage.deployment, DeploymentType::Mcg);
        assert!(!state.security_and_network.encryption.cluster_wide);
        assert_eq!(state.step_id_reached, 4);
    }

    #[test]
    fn test_disable_arbiter_clears_location() {
        let state = dispatch_all(vec![
            Action::EnableArbiter(true),
            Action::SetArbiterLocation("zone-a".to_string()),
            Action::EnableArbiter(false),
        ]);
        assert_eq!(state.capacity_and_nodes.arbiter_location, "");
    }

    #[test]
    fn test_reduce_does_not_touch_input() {
        let initial = WizardState::initial();
        let _ = reduce(&initial, Action::EnableNfs(true));
        assert!(!initial.backing_storage.enable_nfs);
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0u32..10).prop_map(Action::SetStepIdReached),
            prop_oneof![
                Just(BackingStorageType::Existing),
                Just(BackingStorageType::LocalDevices),
                Just(BackingStorageType::External),
            ]
            .prop_map(Action::SetBackingStorageType),
            prop_oneof![Just(DeploymentType::Full), Just(DeploymentType::Mcg)]
                .prop_map(Action::SetDeployment),
            any::<bool>().prop_map(Action::EnableNfs),
            any::<bool>().prop_map(Action::EnableArbiter),
            "[a-z]{0,6}".prop_map(Action::SetExternalStorage),
            proptest::option::of("[0-9]Ti").prop_map(Action::SetCapacity),
        ]
    }

    proptest! {
        #[test]
        fn prop_step_id_reached_is_monotonic(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = WizardState::initial();
            for action in actions {
                let next = reduce(&state, action);
                prop_assert!(next.step_id_reached >= state.step_id_reached);
                state = next;
            }
        }

        #[test]
        fn prop_external_storage_only_kept_for_external(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let mut state = WizardState::initial();
            for action in actions {
                let switched = matches!(action, Action::SetBackingStorageType(_));
                state = reduce(&state, action);
                if switched && state.backing_storage.kind != BackingStorageType::External {
                    prop_assert_eq!(state.backing_storage.external_storage.as_str(), "");
                }
            }
        }
    }
}
