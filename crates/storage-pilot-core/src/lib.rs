//! storage-pilot-core: wizard state machine for storage-pilot
//!
//! This crate holds everything that does not touch a terminal or a cluster:
//! the wizard state and its reducer, the step sequencer and gates, payload
//! assembly, the external storage provider extension point, and the S3
//! bucket documents. Cluster access goes through the [`ClusterApi`] trait.

pub mod action;
pub mod answers;
pub mod async_state;
pub mod bucket;
pub mod config;
pub mod error;
pub mod gate;
pub mod node;
pub mod payload;
pub mod provider;
pub mod reducer;
pub mod state;
pub mod steps;
pub mod submit;
pub mod tls;
pub mod types;
pub mod wizard;

pub use action::{Action, FieldUpdate, LocalVolumeSetUpdate};
pub use answers::Answers;
pub use async_state::AsyncState;
pub use config::PilotConfig;
pub use error::CoreError;
pub use gate::{can_advance, check_cluster, check_step};
pub use node::{NodeTaint, WizardNode};
pub use payload::{Payload, ResourceModel};
pub use provider::{ExternalStorageProvider, ProviderRegistry};
pub use reducer::reduce;
pub use state::WizardState;
pub use steps::{StepName, WizardContext, WizardStep, compute_steps};
pub use submit::{
    ApiError, ClusterApi, Operation, SubmissionPlan, SubmitError, execute, execute_with_progress,
    plan_submission,
};
pub use types::*;
pub use wizard::Wizard;
