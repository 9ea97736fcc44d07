//! Editable rows for each wizard step
//!
//! Rows are rebuilt from the wizard state on every key press and draw, so
//! the actions they carry always reflect the current values.

use std::collections::BTreeSet;
use storage_k8s::Inventory;
use storage_pilot_core::action::{Action, FieldUpdate, LocalVolumeSetUpdate};
use storage_pilot_core::node::{format_bytes, total_cpu, total_memory};
use storage_pilot_core::provider::{FieldKind, FormField, ProviderStep, form_values};
use storage_pilot_core::state::{Encryption, Kms, PostgresKeys, StorageClassSelection, WizardState};
use storage_pilot_core::{
    BackingStorageType, KmsProvider, NetworkType, StepName, VaultAuthMethod, Wizard, WizardNode,
};

/// Capacities offered for a dynamically provisioned cluster
pub const CAPACITY_OPTIONS: [&str; 3] = ["0.5Ti", "2Ti", "4Ti"];

/// Builds the actions for a committed text value; `None` rejects the input
pub type Apply = Box<dyn Fn(&str) -> Option<Vec<Action>>>;

pub enum Edit {
    ReadOnly,
    /// Enter or space dispatches the actions
    Activate(Vec<Action>),
    Text {
        value: String,
        secret: bool,
        apply: Apply,
    },
}

pub struct FormRow {
    pub label: String,
    pub display: String,
    pub edit: Edit,
}

fn mark(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}

impl FormRow {
    fn info(label: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            display: display.into(),
            edit: Edit::ReadOnly,
        }
    }

    fn toggle(label: impl Into<String>, on: bool, action: Action) -> Self {
        Self {
            label: label.into(),
            display: mark(on).to_string(),
            edit: Edit::Activate(vec![action]),
        }
    }

    fn choice(label: impl Into<String>, display: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            label: label.into(),
            display: display.into(),
            edit: Edit::Activate(actions),
        }
    }

    fn option(label: impl Into<String>, selected: bool, text: &str, action: Action) -> Self {
        Self {
            label: label.into(),
            display: format!("{} {}", mark(selected), text),
            edit: Edit::Activate(vec![action]),
        }
    }

    fn text(
        label: impl Into<String>,
        value: &str,
        apply: impl Fn(&str) -> Option<Vec<Action>> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            display: value.to_string(),
            edit: Edit::Text {
                value: value.to_string(),
                secret: false,
                apply: Box::new(apply),
            },
        }
    }

    fn secret(
        label: impl Into<String>,
        value: &str,
        apply: impl Fn(&str) -> Option<Vec<Action>> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            display: mask(value),
            edit: Edit::Text {
                value: value.to_string(),
                secret: true,
                apply: Box::new(apply),
            },
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self.edit, Edit::ReadOnly)
    }
}

/// Rows of the given step
pub fn rows_for(step: StepName, wizard: &Wizard, inventory: &Inventory) -> Vec<FormRow> {
    let state = wizard.state();
    match step {
        StepName::BackingStorage => backing_storage_rows(wizard, inventory),
        StepName::CapacityAndNodes => capacity_rows(state, inventory),
        StepName::CreateLocalVolumeSet => local_volume_set_rows(state, inventory),
        StepName::Security => security_rows(state, false),
        StepName::SecurityAndNetwork => security_rows(state, true),
        StepName::CreateStorageClass => provider_rows(wizard, ProviderStep::CreateStorageClass),
        StepName::ConnectionDetails => provider_rows(wizard, ProviderStep::ConnectionDetails),
        StepName::DataProtection => vec![FormRow::toggle(
            "Prepare for disaster recovery",
            state.data_protection.enable_rdr_preparation,
            Action::EnableRdrPreparation(!state.data_protection.enable_rdr_preparation),
        )],
        StepName::ReviewAndCreate => review_rows(wizard),
    }
}

fn one(action: Action) -> Option<Vec<Action>> {
    Some(vec![action])
}

fn backing_storage_rows(wizard: &Wizard, inventory: &Inventory) -> Vec<FormRow> {
    let state = wizard.state();
    let backing = &state.backing_storage;
    let mut rows = vec![FormRow::choice(
        "Backing storage",
        backing.kind.label(),
        vec![Action::SetBackingStorageType(backing.kind.next())],
    )];

    if !state.is_external() {
        rows.push(FormRow::choice(
            "Deployment",
            backing.deployment.label(),
            vec![Action::SetDeployment(backing.deployment.toggle())],
        ));
    }

    match backing.kind {
        BackingStorageType::Existing => {
            let classes = inventory.usable_storage_classes();
            if classes.is_empty() {
                rows.push(FormRow::info("Storage class", "no usable storage classes"));
            }
            for class in classes {
                let text = format!("{} ({})", class.name, class.provisioner);
                rows.push(FormRow::option(
                    "Storage class",
                    state.storage_class.name == class.name,
                    &text,
                    Action::SetStorageClass(StorageClassSelection {
                        name: class.name.clone(),
                        provisioner: class.provisioner.clone(),
                    }),
                ));
            }
        }
        BackingStorageType::LocalDevices => {
            rows.push(FormRow::info("Storage class", "created from a local volume set"));
        }
        BackingStorageType::External => {
            for provider in wizard.registry().iter() {
                let kind = provider.model().kind.to_string();
                rows.push(FormRow::option(
                    "Platform",
                    backing.external_storage == kind,
                    provider.display_name(),
                    Action::SetExternalStorage(kind),
                ));
            }
            if let Some(provisioner) = wizard
                .registry()
                .selected(state)
                .and_then(|p| p.provisioner().map(str::to_string))
            {
                rows.push(FormRow::text(
                    "Storage class name",
                    &state.storage_class.name,
                    move |name| {
                        one(Action::SetStorageClass(StorageClassSelection {
                            name: name.trim().to_string(),
                            provisioner: provisioner.clone(),
                        }))
                    },
                ));
            }
        }
    }

    if !state.is_external() && !state.is_mcg() {
        rows.push(FormRow::toggle(
            "Network file system",
            backing.enable_nfs,
            Action::EnableNfs(!backing.enable_nfs),
        ));
        rows.push(FormRow::toggle(
            "Default RBD storage class",
            backing.is_rbd_storage_class_default,
            Action::SetRbdStorageClassDefault(!backing.is_rbd_storage_class_default),
        ));
    }

    if !state.is_external() {
        rows.extend(postgres_rows(state));
    }
    rows
}

fn postgres_rows(state: &WizardState) -> Vec<FormRow> {
    let backing = &state.backing_storage;
    let mut rows = vec![FormRow::toggle(
        "External Postgres",
        backing.use_external_postgres,
        Action::UseExternalPostgres(!backing.use_external_postgres),
    )];
    if !backing.use_external_postgres {
        return rows;
    }

    let pg = &backing.external_postgres;
    rows.push(FormRow::text("  Username", &pg.username, |v| {
        one(Action::SetPostgresUsername(v.to_string()))
    }));
    rows.push(FormRow::secret("  Password", &pg.password, |v| {
        one(Action::SetPostgresPassword(v.to_string()))
    }));
    rows.push(FormRow::text("  Server name", &pg.server_name, |v| {
        one(Action::SetPostgresServerName(v.to_string()))
    }));
    rows.push(FormRow::text("  Port", &pg.port, |v| {
        v.trim()
            .parse::<u16>()
            .ok()
            .map(|port| vec![Action::SetPostgresPort(port.to_string())])
    }));
    rows.push(FormRow::text("  Database", &pg.database_name, |v| {
        one(Action::SetPostgresDatabaseName(v.to_string()))
    }));

    let tls = &pg.tls;
    rows.push(FormRow::toggle("  TLS", tls.enabled, Action::SetPostgresTls(!tls.enabled)));
    if tls.enabled {
        rows.push(FormRow::toggle(
            "  Allow self-signed certificates",
            tls.allow_self_signed_certs,
            Action::SetPostgresAllowSelfSignedCerts(!tls.allow_self_signed_certs),
        ));
        rows.push(FormRow::toggle(
            "  Client certificates",
            tls.enable_client_side_certs,
            Action::SetPostgresEnableClientSideCerts(!tls.enable_client_side_certs),
        ));
    }
    if tls.enabled && tls.enable_client_side_certs {
        let keys = tls.keys.clone();
        rows.push(pem_file_row("  Client key file", &keys.private, {
            let keys = keys.clone();
            move |pem| PostgresKeys {
                private: Some(pem),
                public: keys.public.clone(),
            }
        }));
        rows.push(pem_file_row("  Client certificate file", &keys.public, move |pem| {
            PostgresKeys {
                private: keys.private.clone(),
                public: Some(pem),
            }
        }));
    }
    rows
}

/// A row that reads a PEM file from the entered path
fn pem_file_row(
    label: &str,
    current: &Option<String>,
    keys: impl Fn(String) -> PostgresKeys + 'static,
) -> FormRow {
    let mut row = FormRow::text(label, "", move |path| {
        std::fs::read_to_string(path.trim())
            .ok()
            .map(|pem| vec![Action::SetPostgresKeys(keys(pem))])
    });
    row.display = match current {
        Some(pem) => format!("loaded ({} bytes)", pem.len()),
        None => "not set".to_string(),
    };
    row
}

fn node_summary(node: &WizardNode) -> String {
    format!(
        "{:<28} {:>5} CPU {:>10}  {}",
        node.name,
        node.cpu,
        format_bytes(node.memory),
        if node.zone.is_empty() { "-" } else { &node.zone }
    )
}

fn toggled_nodes(selected: &[WizardNode], node: &WizardNode, inventory: &Inventory) -> Vec<WizardNode> {
    let mut names: BTreeSet<&str> = selected.iter().map(|n| n.name.as_str()).collect();
    if !names.remove(node.name.as_str()) {
        names.insert(node.name.as_str());
    }
    inventory
        .nodes
        .iter()
        .filter(|n| names.contains(n.name.as_str()))
        .cloned()
        .collect()
}

fn capacity_rows(state: &WizardState, inventory: &Inventory) -> Vec<FormRow> {
    let capacity = &state.capacity_and_nodes;
    let local = state.storage_class.is_no_provisioner();
    let mut rows = Vec::new();

    if !state.is_mcg() {
        if local {
            rows.push(FormRow::info("Local PVs", capacity.pv_count.to_string()));
        } else {
            let current = capacity.capacity.as_deref();
            let next = CAPACITY_OPTIONS
                .iter()
                .position(|c| Some(*c) == current)
                .map_or(0, |i| (i + 1) % CAPACITY_OPTIONS.len());
            rows.push(FormRow::choice(
                "Capacity",
                current.unwrap_or("not set"),
                vec![Action::SetCapacity(Some(CAPACITY_OPTIONS[next].to_string()))],
            ));
        }
        rows.push(FormRow::choice(
            "Resource profile",
            capacity.resource_profile.as_str(),
            vec![Action::SetResourceProfile(capacity.resource_profile.next())],
        ));
        rows.push(FormRow::toggle(
            "Stretch cluster with arbiter",
            capacity.enable_arbiter,
            Action::EnableArbiter(!capacity.enable_arbiter),
        ));
        if capacity.enable_arbiter {
            let zones: Vec<&str> = storage_pilot_core::node::zones(&inventory.nodes)
                .into_iter()
                .collect();
            let next = zones
                .iter()
                .position(|z| *z == capacity.arbiter_location)
                .map_or(0, |i| (i + 1) % zones.len().max(1));
            let actions = zones
                .get(next)
                .map(|z| vec![Action::SetArbiterLocation(z.to_string())])
                .unwrap_or_default();
            let current = if capacity.arbiter_location.is_empty() {
                "not set"
            } else {
                capacity.arbiter_location.as_str()
            };
            rows.push(FormRow::choice("  Arbiter zone", current, actions));
        }
    }

    rows.push(FormRow::toggle(
        "Taint nodes",
        capacity.enable_taint,
        Action::EnableTaint(!capacity.enable_taint),
    ));

    let chart_nodes = &state.create_local_volume_set.chart_nodes;
    let candidates = inventory
        .nodes
        .iter()
        .filter(|n| !local || chart_nodes.contains(&n.name));
    for node in candidates {
        let selected = state.nodes.iter().any(|n| n.name == node.name);
        rows.push(FormRow::option(
            "Node",
            selected,
            &node_summary(node),
            Action::SetNodes(toggled_nodes(&state.nodes, node, inventory)),
        ));
    }

    rows.push(FormRow::info(
        "Selected",
        format!(
            "{} nodes, {} CPU, {}",
            state.nodes.len(),
            total_cpu(&state.nodes),
            format_bytes(total_memory(&state.nodes))
        ),
    ));
    rows
}

fn lvs(update: LocalVolumeSetUpdate) -> Option<Vec<Action>> {
    one(Action::SetCreateLocalVolumeSet(update))
}

fn local_volume_set_rows(state: &WizardState, inventory: &Inventory) -> Vec<FormRow> {
    let set = &state.create_local_volume_set;
    let disk_type = format!("{:?}", set.disk_type);
    let mut rows = vec![
        FormRow::text("Volume set name", &set.volume_set_name, |v| {
            lvs(LocalVolumeSetUpdate::VolumeSetName(v.trim().to_string()))
        }),
        FormRow::choice(
            "Disk type",
            disk_type,
            vec![Action::SetCreateLocalVolumeSet(LocalVolumeSetUpdate::DiskType(
                set.disk_type.next(),
            ))],
        ),
        FormRow::text("Minimum disk size", &set.min_disk_size.to_string(), |v| {
            v.trim()
                .parse::<u64>()
                .ok()
                .and_then(|size| lvs(LocalVolumeSetUpdate::MinDiskSize(size)))
        }),
        FormRow::text("Maximum disk size", &set.max_disk_size, |v| {
            lvs(LocalVolumeSetUpdate::MaxDiskSize(v.trim().to_string()))
        }),
        FormRow::choice(
            "Size unit",
            set.disk_size_unit.as_str(),
            vec![Action::SetCreateLocalVolumeSet(
                LocalVolumeSetUpdate::DiskSizeUnit(set.disk_size_unit.toggle()),
            )],
        ),
        FormRow::text("Disk limit per node", &set.max_disk_limit, |v| {
            lvs(LocalVolumeSetUpdate::MaxDiskLimit(v.trim().to_string()))
        }),
        FormRow::toggle(
            "Filter nodes",
            set.lvs_is_select_nodes,
            Action::SetCreateLocalVolumeSet(LocalVolumeSetUpdate::LvsIsSelectNodes(
                !set.lvs_is_select_nodes,
            )),
        ),
    ];

    if set.lvs_is_select_nodes {
        for node in &inventory.nodes {
            let selected = set.lvs_select_nodes.contains(&node.name);
            let mut names = set.lvs_select_nodes.clone();
            if selected {
                names.retain(|n| n != &node.name);
            } else {
                names.push(node.name.clone());
            }
            rows.push(FormRow::option(
                "  Node",
                selected,
                &node_summary(node),
                Action::SetCreateLocalVolumeSet(LocalVolumeSetUpdate::LvsSelectNodes(names)),
            ));
        }
    }

    rows.push(FormRow::info(
        "Nodes with matching disks",
        set.chart_nodes.len().to_string(),
    ));
    rows.push(FormRow::info(
        "Matching disks",
        state.capacity_and_nodes.pv_count.to_string(),
    ));
    rows
}

fn with_encryption(encryption: &Encryption, kms: &Kms, edit: impl Fn(&mut Encryption)) -> Vec<Action> {
    let mut encryption = encryption.clone();
    edit(&mut encryption);
    let mut kms = kms.clone();
    kms.has_handled = !encryption.advanced || kms.is_complete();
    encryption.has_handled = true;
    vec![Action::SetEncryption(encryption), Action::SetKms(kms)]
}

fn kms_update(kms: &Kms, edit: impl Fn(&mut Kms)) -> Vec<Action> {
    let mut kms = kms.clone();
    edit(&mut kms);
    kms.has_handled = kms.is_complete();
    vec![Action::SetKms(kms)]
}

fn kms_text(
    label: &str,
    kms: &Kms,
    value: &str,
    secret: bool,
    edit: impl Fn(&mut Kms, String) + 'static,
) -> FormRow {
    let kms = kms.clone();
    let apply = move |v: &str| {
        let value = v.trim().to_string();
        Some(kms_update(&kms, |k| edit(k, value.clone())))
    };
    if secret {
        FormRow::secret(label, value, apply)
    } else {
        FormRow::text(label, value, apply)
    }
}

fn kms_rows(kms: &Kms) -> Vec<FormRow> {
    let provider = match kms.provider {
        KmsProvider::Vault => "Vault",
        KmsProvider::Kmip => "KMIP",
    };
    let mut rows = vec![FormRow::choice(
        "  Key management service",
        provider,
        kms_update(kms, |k| k.provider = k.provider.toggle()),
    )];

    match kms.provider {
        KmsProvider::Vault => {
            let vault = &kms.vault;
            rows.push(kms_text("  Connection name", kms, &vault.name, false, |k, v| k.vault.name = v));
            rows.push(kms_text("  Address", kms, &vault.address, false, |k, v| k.vault.address = v));
            rows.push(kms_text("  Port", kms, &vault.port, false, |k, v| k.vault.port = v));
            let auth = match vault.auth_method {
                VaultAuthMethod::Token => "token",
                VaultAuthMethod::Kubernetes => "kubernetes",
            };
            rows.push(FormRow::choice(
                "  Authentication",
                auth,
                kms_update(kms, |k| k.vault.auth_method = k.vault.auth_method.toggle()),
            ));
            match vault.auth_method {
                VaultAuthMethod::Token => rows.push(kms_text("  Token", kms, &vault.token, true, |k, v| {
                    k.vault.token = v
                })),
                VaultAuthMethod::Kubernetes => rows.push(kms_text("  Role", kms, &vault.role, false, |k, v| {
                    k.vault.role = v
                })),
            }
            rows.push(kms_text("  Backend path", kms, &vault.backend, false, |k, v| {
                k.vault.backend = v
            }));
            rows.push(kms_text("  TLS server name", kms, &vault.tls_server_name, false, |k, v| {
                k.vault.tls_server_name = v
            }));
            rows.push(kms_text("  Vault namespace", kms, &vault.provider_namespace, false, |k, v| {
                k.vault.provider_namespace = v
            }));
        }
        KmsProvider::Kmip => {
            let kmip = &kms.kmip;
            rows.push(kms_text("  Connection name", kms, &kmip.name, false, |k, v| k.kmip.name = v));
            rows.push(kms_text("  Address", kms, &kmip.address, false, |k, v| k.kmip.address = v));
            rows.push(kms_text("  Port", kms, &kmip.port, false, |k, v| k.kmip.port = v));
            rows.push(kms_text("  TLS server name", kms, &kmip.tls_server_name, false, |k, v| {
                k.kmip.tls_server_name = v
            }));
            rows.push(kms_text("  Unique identifier", kms, &kmip.unique_identifier, false, |k, v| {
                k.kmip.unique_identifier = v
            }));
            rows.push(kms_text("  Client CA", kms, &kmip.client_ca, true, |k, v| k.kmip.client_ca = v));
            rows.push(kms_text("  Client certificate", kms, &kmip.client_cert, true, |k, v| {
                k.kmip.client_cert = v
            }));
            rows.push(kms_text("  Client key", kms, &kmip.client_key, true, |k, v| k.kmip.client_key = v));
        }
    }
    rows
}

fn network_name(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn security_rows(state: &WizardState, with_network: bool) -> Vec<FormRow> {
    let security = &state.security_and_network;
    let encryption = &security.encryption;
    let kms = &security.kms;

    let mut rows = vec![
        FormRow::choice(
            "Cluster-wide encryption",
            mark(encryption.cluster_wide),
            with_encryption(encryption, kms, |e| e.cluster_wide = !e.cluster_wide),
        ),
        FormRow::choice(
            "Storage class encryption",
            mark(encryption.storage_class),
            with_encryption(encryption, kms, |e| e.storage_class = !e.storage_class),
        ),
        FormRow::choice(
            "In-transit encryption",
            mark(encryption.in_transit),
            with_encryption(encryption, kms, |e| e.in_transit = !e.in_transit),
        ),
    ];

    if !state.is_mcg() && (encryption.cluster_wide || encryption.storage_class) {
        rows.push(FormRow::choice(
            "External key management",
            mark(encryption.advanced),
            with_encryption(encryption, kms, |e| e.advanced = !e.advanced),
        ));
        if encryption.advanced {
            rows.extend(kms_rows(kms));
        }
    }

    if with_network {
        let multus = security.network_type == NetworkType::Multus;
        rows.push(FormRow::choice(
            "Network",
            if multus { "Multus" } else { "Default (SDN)" },
            vec![Action::SetNetworkType(security.network_type.toggle())],
        ));
        if multus {
            rows.push(FormRow::text(
                "  Public network",
                security.public_network.as_deref().unwrap_or(""),
                |v| one(Action::SetPublicNetwork(network_name(v))),
            ));
            rows.push(FormRow::text(
                "  Cluster network",
                security.cluster_network.as_deref().unwrap_or(""),
                |v| one(Action::SetClusterNetwork(network_name(v))),
            ));
        }
    }
    rows
}

fn provider_action(step: ProviderStep, field: &'static str, value: String) -> Action {
    let update = FieldUpdate::new(field, value);
    match step {
        ProviderStep::CreateStorageClass => Action::SetCreateStorageClass(update),
        ProviderStep::ConnectionDetails => Action::SetConnectionDetails(update),
    }
}

fn provider_field_row(step: ProviderStep, field: &FormField, current: &str) -> FormRow {
    let label = if field.required {
        format!("{} *", field.label)
    } else {
        field.label.to_string()
    };
    let id = field.id;

    match field.kind {
        FieldKind::Text => FormRow::text(label, current, move |v| {
            one(provider_action(step, id, v.trim().to_string()))
        }),
        FieldKind::Secret => FormRow::secret(label, current, move |v| {
            one(provider_action(step, id, v.to_string()))
        }),
        FieldKind::Choice(options) => {
            let next = options
                .iter()
                .position(|o| *o == current)
                .map_or(0, |i| (i + 1) % options.len().max(1));
            let actions = options
                .get(next)
                .map(|o| vec![provider_action(step, id, o.to_string())])
                .unwrap_or_default();
            let display = if current.is_empty() { "not set" } else { current };
            FormRow::choice(label, display, actions)
        }
        FieldKind::Json => {
            // The document is read from a file path
            let mut row = FormRow::text(label, "", move |path| {
                std::fs::read_to_string(path.trim())
                    .ok()
                    .map(|content| vec![provider_action(step, id, content)])
            });
            row.display = if current.is_empty() {
                "not set".to_string()
            } else {
                format!("loaded ({} bytes)", current.len())
            };
            row
        }
    }
}

fn provider_rows(wizard: &Wizard, step: ProviderStep) -> Vec<FormRow> {
    let state = wizard.state();
    let Some(provider) = wizard.registry().selected(state) else {
        return vec![FormRow::info("Platform", "none selected")];
    };
    let values = form_values(state, step);
    let mut rows = vec![FormRow::info("Platform", provider.display_name())];
    rows.extend(provider.form().iter().map(|field| {
        let current = values.get(field.id).map(String::as_str).unwrap_or("");
        provider_field_row(step, field, current)
    }));
    rows
}

fn review_rows(wizard: &Wizard) -> Vec<FormRow> {
    let state = wizard.state();
    let backing = &state.backing_storage;
    let mut rows = vec![FormRow::info("Backing storage", backing.kind.label())];

    if state.is_external() {
        let platform = wizard
            .registry()
            .selected(state)
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| backing.external_storage.clone());
        rows.push(FormRow::info("Platform", platform));
    } else {
        rows.push(FormRow::info("Deployment", backing.deployment.label()));
        let capacity = &state.capacity_and_nodes;
        rows.push(FormRow::info("Nodes", state.nodes.len().to_string()));
        if let Some(requested) = &capacity.capacity {
            rows.push(FormRow::info("Capacity", requested.clone()));
        }
        rows.push(FormRow::info("Resource profile", capacity.resource_profile.as_str()));
        rows.push(FormRow::info("Taint nodes", mark(capacity.enable_taint)));
        if capacity.enable_arbiter {
            rows.push(FormRow::info("Arbiter zone", capacity.arbiter_location.clone()));
        }
    }
    if !state.storage_class.name.is_empty() {
        rows.push(FormRow::info("Storage class", state.storage_class.name.clone()));
    }

    let encryption = &state.security_and_network.encryption;
    let mut enabled = Vec::new();
    if encryption.cluster_wide {
        enabled.push("cluster-wide");
    }
    if encryption.storage_class {
        enabled.push("storage class");
    }
    if encryption.in_transit {
        enabled.push("in-transit");
    }
    if encryption.advanced {
        enabled.push("external KMS");
    }
    let encryption = if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(", ")
    };
    rows.push(FormRow::info("Encryption", encryption));
    rows
}
