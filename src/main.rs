//! storage-pilot: A terminal wizard for provisioning storage systems on Kubernetes

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::fs::File;
use std::path::{Path, PathBuf};
use storage_k8s::{Inventory, KubeClusterApi, create_client, load};
use storage_pilot_core::bucket::{
    BucketPolicy, CorsConfiguration, PolicyTemplate, PublicAccessBlockConfiguration,
    validate_cors, validate_policy,
};
use storage_pilot_core::{
    Action, Answers, BackingStorageType, CoreError, PilotConfig, ProviderRegistry, SubmissionPlan,
    Wizard, execute, plan_submission,
};
use storage_pilot_tui::App;
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};

/// storage-pilot: Create a storage system on a Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "storage-pilot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Kubeconfig context to use
    #[arg(short, long)]
    context: Option<String>,

    /// Path to the storage-pilot config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Namespace of the storage operators
    #[arg(short, long)]
    namespace: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log file path (default: <temp_dir>/storage-pilot.log)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the wizard from an answers file instead of the terminal UI
    Apply {
        /// YAML file with the node names and wizard actions
        #[arg(short, long)]
        answers: PathBuf,

        /// Print the operations instead of applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Bucket policy and CORS documents
    Bucket {
        #[command(subcommand)]
        command: BucketCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BucketCommand {
    /// Print a ready-made bucket policy
    Template {
        #[arg(value_enum)]
        kind: TemplateKind,

        #[arg(short, long)]
        bucket: String,

        /// Account granted access, for account-access
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Check a policy or CORS document
    Validate {
        #[arg(value_enum)]
        document: DocumentKind,

        file: PathBuf,

        /// Bucket the policy must target
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Print a public access block that blocks everything
    BlockPublicAccess,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TemplateKind {
    PublicRead,
    AccountAccess,
    SecureTransport,
    DenyDelete,
}

impl From<TemplateKind> for PolicyTemplate {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::PublicRead => PolicyTemplate::PublicRead,
            TemplateKind::AccountAccess => PolicyTemplate::AccountAccess,
            TemplateKind::SecureTransport => PolicyTemplate::SecureTransport,
            TemplateKind::DenyDelete => PolicyTemplate::DenyDelete,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DocumentKind {
    Policy,
    Cors,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging to file (not stdout, which would corrupt TUI)
    let log_path = resolve_log_path(cli.log_file.clone());
    let log_file = File::create(&log_path)?;

    // Build filter: set base level, but quiet down noisy HTTP libraries
    let filter = if cli.debug {
        EnvFilter::from_default_env()
            .add_directive(Level::DEBUG.into())
            .add_directive("h2=info".parse()?)
            .add_directive("hyper=info".parse()?)
            .add_directive("hyper_util=info".parse()?)
            .add_directive("tower=info".parse()?)
            .add_directive("kube_client=info".parse()?)
            .add_directive("rustls=info".parse()?)
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(true)
                .with_target(false),
        )
        .with(filter)
        .init();

    tracing::info!("Starting storage-pilot");

    let config = resolve_config(
        PilotConfig::load(cli.config.as_deref())?,
        cli.context.clone(),
        cli.namespace.clone(),
    );
    if let Some(ctx) = &config.kube_context {
        tracing::info!("Using context: {}", ctx);
    }
    tracing::info!("Using namespace: {}", config.namespace);

    match cli.command {
        None => {
            let mut app = App::new(config, ProviderRegistry::with_builtins());
            app.run().await?;
        }
        Some(Command::Apply { answers, dry_run }) => apply(config, &answers, dry_run).await?,
        Some(Command::Bucket { command }) => bucket(command)?,
    }

    tracing::info!("Goodbye!");
    Ok(())
}

/// Resolve the log file path, falling back to the platform temp directory.
fn resolve_log_path(log_file: Option<String>) -> PathBuf {
    match log_file {
        Some(path) => PathBuf::from(path),
        None => std::env::temp_dir().join("storage-pilot.log"),
    }
}

/// Command line flags override the config file
fn resolve_config(
    mut config: PilotConfig,
    context: Option<String>,
    namespace: Option<String>,
) -> PilotConfig {
    if context.is_some() {
        config.kube_context = context;
    }
    if let Some(namespace) = namespace {
        config.namespace = namespace;
    }
    config
}

/// Drive a wizard through every step with the answers, returning the plan
fn replay_answers(
    wizard: &mut Wizard,
    answers: &Answers,
    inventory: &Inventory,
    config: &PilotConfig,
) -> std::result::Result<SubmissionPlan, CoreError> {
    for action in answers.actions()? {
        wizard.dispatch(action);
    }

    let local = wizard.state().backing_storage.kind == BackingStorageType::LocalDevices;
    if local {
        wizard.refresh_local_volume_set(&inventory.node_names(), &inventory.devices);
    }

    let mut nodes = answers.resolve_nodes(&inventory.nodes)?;
    if nodes.is_empty() && local {
        // Default to every node with a matching disk
        let chart_nodes = &wizard.state().create_local_volume_set.chart_nodes;
        nodes = inventory
            .nodes
            .iter()
            .filter(|n| chart_nodes.contains(&n.name))
            .cloned()
            .collect();
    }
    if !nodes.is_empty() {
        wizard.dispatch(Action::SetNodes(nodes));
    }

    while !wizard.is_last_step() {
        wizard.next()?;
    }

    plan_submission(wizard.state(), wizard.context(), wizard.registry(), config)
}

async fn apply(config: PilotConfig, answers: &Path, dry_run: bool) -> Result<()> {
    let answers = Answers::from_path(answers)?;
    let client = create_client(config.kube_context.as_deref()).await?;
    let inventory = load(&client, &config).await?;

    let mut wizard = Wizard::new(inventory.context(), ProviderRegistry::with_builtins());
    let plan = replay_answers(&mut wizard, &answers, &inventory, &config)?;

    if dry_run {
        print!("{}", serde_yaml::to_string(&plan)?);
        return Ok(());
    }

    let api = KubeClusterApi::new(client);
    execute(&plan, &api, wizard.registry()).await?;
    println!("Applied {} operations", plan.len());
    Ok(())
}

fn bucket(command: BucketCommand) -> Result<()> {
    match command {
        BucketCommand::Template {
            kind,
            bucket,
            account,
        } => {
            let policy = PolicyTemplate::from(kind).render(&bucket, account.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
        }
        BucketCommand::Validate {
            document,
            file,
            bucket,
        } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
            match document {
                DocumentKind::Policy => {
                    let policy = BucketPolicy::from_json(&content)?;
                    validate_policy(&policy, bucket.as_deref())?;
                    if policy.is_public() {
                        println!("valid (grants public access)");
                    } else {
                        println!("valid");
                    }
                }
                DocumentKind::Cors => {
                    validate_cors(&CorsConfiguration::from_json(&content)?)?;
                    println!("valid");
                }
            }
        }
        BucketCommand::BlockPublicAccess => {
            let block = PublicAccessBlockConfiguration::block_all();
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_pilot_core::payload::DiscoveredDevice;
    use std::ffi::OsString;
    use storage_pilot_core::{Operation, WizardNode};

    #[test]
    fn default_log_path_uses_temp_dir() {
        let path = resolve_log_path(None);
        let expected = std::env::temp_dir().join("storage-pilot.log");
        assert_eq!(path, expected);
    }

    #[test]
    fn default_log_path_parent_exists() {
        let path = resolve_log_path(None);
        assert!(
            path.parent().unwrap().exists(),
            "default log path parent directory does not exist: {}",
            path.display()
        );
    }

    #[test]
    fn explicit_log_path_is_used() {
        let custom = "/some/custom/path.log".to_string();
        let path = resolve_log_path(Some(custom.clone()));
        assert_eq!(path, PathBuf::from(custom));
    }

    #[test]
    fn flags_override_config() {
        let config = resolve_config(
            PilotConfig::default(),
            Some("prod".to_string()),
            Some("storage".to_string()),
        );
        assert_eq!(config.kube_context.as_deref(), Some("prod"));
        assert_eq!(config.namespace, "storage");

        let config = resolve_config(PilotConfig::default(), None, None);
        assert_eq!(config, PilotConfig::default());
    }

    fn node(name: &str) -> WizardNode {
        WizardNode {
            name: name.to_string(),
            cpu: 16.0,
            memory: 64 << 30,
            ..Default::default()
        }
    }

    fn inventory() -> Inventory {
        Inventory {
            nodes: vec![node("worker-0"), node("worker-1"), node("worker-2")],
            devices: ["worker-0", "worker-1", "worker-2"]
                .iter()
                .map(|n| DiscoveredDevice {
                    node: n.to_string(),
                    path: "/dev/sdb".to_string(),
                    device_type: "disk".to_string(),
                    size: 500 << 30,
                    rotational: false,
                    status: "Available".to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn created_kinds(plan: &SubmissionPlan) -> Vec<String> {
        plan.payloads().map(|p| p.model.kind.to_string()).collect()
    }

    #[test]
    fn replay_existing_storage_class() {
        let answers = Answers::from_yaml(
            r#"
nodes: [worker-0, worker-1, worker-2]
actions:
  - type: wizard/setStorageClass
    payload: { name: gp3-csi, provisioner: ebs.csi.aws.com }
  - type: capacityAndNodes/capacity
    payload: 2Ti
"#,
        )
        .unwrap();
        let config = PilotConfig::default();
        let mut wizard = Wizard::new(Default::default(), ProviderRegistry::with_builtins());

        let plan = replay_answers(&mut wizard, &answers, &inventory(), &config).unwrap();
        assert!(matches!(
            plan.operations[0],
            Operation::EnsureNamespace { .. }
        ));
        let kinds = created_kinds(&plan);
        assert_eq!(kinds, vec!["StorageSystem", "StorageCluster"]);
    }

    #[test]
    fn replay_local_devices_defaults_to_matching_nodes() {
        let answers = Answers::from_yaml(
            r#"
actions:
  - type: backingStorage/setType
    payload: LOCAL_DEVICES
  - type: wizard/setCreateLocalVolumeSet
    payload: { field: volumeSetName, value: local-block }
"#,
        )
        .unwrap();
        let config = PilotConfig::default();
        let mut wizard = Wizard::new(Default::default(), ProviderRegistry::with_builtins());

        let plan = replay_answers(&mut wizard, &answers, &inventory(), &config).unwrap();
        assert_eq!(wizard.state().nodes.len(), 3);
        assert_eq!(wizard.state().capacity_and_nodes.pv_count, 3);
        assert_eq!(wizard.state().storage_class.name, "local-block");
        assert!(created_kinds(&plan).contains(&"LocalVolumeSet".to_string()));
    }

    #[test]
    fn replay_stops_at_incomplete_step() {
        let answers = Answers::from_yaml("nodes: [worker-0]\n").unwrap();
        let mut wizard = Wizard::new(Default::default(), ProviderRegistry::with_builtins());
        let err = replay_answers(&mut wizard, &answers, &inventory(), &PilotConfig::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::StepIncomplete(_)));
    }

    #[test]
    fn replay_rejects_unknown_node() {
        let answers = Answers::from_yaml("nodes: [worker-9]\n").unwrap();
        let mut wizard = Wizard::new(Default::default(), ProviderRegistry::with_builtins());
        let err = replay_answers(&mut wizard, &answers, &inventory(), &PilotConfig::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownNode(name) if name == "worker-9"));
    }

    #[test]
    fn config_and_answers_files_drive_apply() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "namespace: odf\nstorageClusterName: primary\n",
        )
        .unwrap();
        let answers_path = dir.path().join("answers.yaml");
        std::fs::write(
            &answers_path,
            r#"
nodes: [worker-0, worker-1, worker-2]
actions:
  - type: wizard/setStorageClass
    payload: { name: gp3-csi, provisioner: ebs.csi.aws.com }
  - type: capacityAndNodes/capacity
    payload: 2Ti
"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            OsString::from("storage-pilot"),
            OsString::from("--config"),
            config_path.into_os_string(),
            OsString::from("--context"),
            OsString::from("lab"),
            OsString::from("apply"),
            OsString::from("--answers"),
            answers_path.into_os_string(),
        ])
        .unwrap();
        let config = resolve_config(
            PilotConfig::load(cli.config.as_deref()).unwrap(),
            cli.context.clone(),
            cli.namespace.clone(),
        );
        assert_eq!(config.namespace, "odf");
        assert_eq!(config.storage_cluster_name, "primary");
        assert_eq!(config.kube_context.as_deref(), Some("lab"));

        let Some(Command::Apply { answers, dry_run }) = cli.command else {
            panic!("expected apply");
        };
        assert!(!dry_run);
        let answers = Answers::from_path(&answers).unwrap();
        let mut wizard = Wizard::new(Default::default(), ProviderRegistry::with_builtins());
        let plan = replay_answers(&mut wizard, &answers, &inventory(), &config).unwrap();
        assert!(matches!(
            &plan.operations[0],
            Operation::EnsureNamespace { name, .. } if name == "odf"
        ));
        assert!(
            plan.payloads()
                .any(|p| p.describe() == "StorageCluster/primary")
        );
    }

    #[test]
    fn cli_parses_bucket_template() {
        let cli = Cli::try_parse_from([
            "storage-pilot",
            "bucket",
            "template",
            "account-access",
            "--bucket",
            "logs",
            "--account",
            "123456789012",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Bucket {
                command: BucketCommand::Template { kind, bucket, .. },
            }) => {
                assert!(matches!(kind, TemplateKind::AccountAccess));
                assert_eq!(bucket, "logs");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
