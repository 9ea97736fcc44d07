//! storage-k8s: Kubernetes access for storage-pilot
//!
//! Client construction, the cluster inventory the wizard renders from, and a
//! [`storage_pilot_core::ClusterApi`] implementation that applies submission
//! plans through the dynamic API.

pub mod api;
pub mod client;
pub mod error;
pub mod inventory;

pub use api::KubeClusterApi;
pub use client::create_client;
pub use error::K8sError;
pub use inventory::{Inventory, StorageClassInfo, StorageClusterSummary, load};
