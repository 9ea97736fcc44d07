//! Domain enumerations shared by the wizard state, the gates and the payloads.

use serde::{Deserialize, Serialize};

/// Minimum number of storage nodes for an internal cluster
pub const MINIMUM_NODES: usize = 3;

/// Minimum number of nodes when the stretch-cluster arbiter is enabled
pub const ARBITER_MINIMUM_NODES: usize = 4;

/// Provisioner placeholder used for local-device and external storage classes
pub const NO_PROVISIONER: &str = "kubernetes.io/no-provisioner";

/// Label applied to every node selected for the storage cluster
pub const STORAGE_NODE_LABEL: &str = "cluster.ocs.openshift.io/openshift-storage";

/// Taint key applied to dedicated storage nodes
pub const STORAGE_TAINT_KEY: &str = "node.ocs.openshift.io/storage";

/// Zone topology label
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Legacy zone topology label
pub const ZONE_LABEL_LEGACY: &str = "failure-domain.beta.kubernetes.io/zone";

/// Rack topology label set by rook on nodes without zones
pub const RACK_LABEL: &str = "topology.rook.io/rack";

/// Hostname label
pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

/// Where the user's storage comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackingStorageType {
    /// An existing storage class of the platform
    #[default]
    Existing,
    /// Local disks discovered on the nodes
    LocalDevices,
    /// A storage system outside the cluster
    External,
}

impl BackingStorageType {
    pub fn label(&self) -> &'static str {
        match self {
            BackingStorageType::Existing => "Use an existing StorageClass",
            BackingStorageType::LocalDevices => "Create a new StorageClass using local storage devices",
            BackingStorageType::External => "Connect an external storage platform",
        }
    }

    /// Cycle through the variants in display order
    pub fn next(&self) -> Self {
        match self {
            BackingStorageType::Existing => BackingStorageType::LocalDevices,
            BackingStorageType::LocalDevices => BackingStorageType::External,
            BackingStorageType::External => BackingStorageType::Existing,
        }
    }
}

/// Which services the storage system provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentType {
    /// Block, file and object services
    #[default]
    Full,
    /// Multicloud object gateway only
    Mcg,
}

impl DeploymentType {
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentType::Full => "Full deployment",
            DeploymentType::Mcg => "MultiCloud Object Gateway",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DeploymentType::Full => DeploymentType::Mcg,
            DeploymentType::Mcg => DeploymentType::Full,
        }
    }
}

/// Resource profile of the storage cluster daemons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceProfile {
    Lean,
    #[default]
    Balanced,
    Performance,
}

/// Aggregate resources a profile needs across the selected nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceRequirements {
    pub min_cpu: f64,
    /// Minimum memory in GiB
    pub min_memory_gib: f64,
}

impl ResourceProfile {
    pub fn requirements(&self) -> ResourceRequirements {
        match self {
            ResourceProfile::Lean => ResourceRequirements {
                min_cpu: 24.0,
                min_memory_gib: 72.0,
            },
            ResourceProfile::Balanced => ResourceRequirements {
                min_cpu: 30.0,
                min_memory_gib: 72.0,
            },
            ResourceProfile::Performance => ResourceRequirements {
                min_cpu: 45.0,
                min_memory_gib: 96.0,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceProfile::Lean => "lean",
            ResourceProfile::Balanced => "balanced",
            ResourceProfile::Performance => "performance",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ResourceProfile::Lean => ResourceProfile::Balanced,
            ResourceProfile::Balanced => ResourceProfile::Performance,
            ResourceProfile::Performance => ResourceProfile::Lean,
        }
    }
}

/// Cluster network layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    /// Pod network
    #[default]
    Default,
    /// Multus network attachment definitions
    Multus,
}

impl NetworkType {
    pub fn toggle(&self) -> Self {
        match self {
            NetworkType::Default => NetworkType::Multus,
            NetworkType::Multus => NetworkType::Default,
        }
    }
}

/// Mechanical property filter for local devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiskType {
    #[default]
    #[serde(rename = "All")]
    All,
    #[serde(rename = "SSD / NVMe")]
    Ssd,
    #[serde(rename = "HDD")]
    Hdd,
}

impl DiskType {
    /// Values for `deviceInclusionSpec.deviceMechanicalProperties`
    pub fn mechanical_properties(&self) -> Vec<&'static str> {
        match self {
            DiskType::All => vec!["Rotational", "NonRotational"],
            DiskType::Ssd => vec!["NonRotational"],
            DiskType::Hdd => vec!["Rotational"],
        }
    }

    pub fn accepts(&self, rotational: bool) -> bool {
        match self {
            DiskType::All => true,
            DiskType::Ssd => !rotational,
            DiskType::Hdd => rotational,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            DiskType::All => DiskType::Ssd,
            DiskType::Ssd => DiskType::Hdd,
            DiskType::Hdd => DiskType::All,
        }
    }
}

/// Kind of block device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Disk,
    Part,
    Mpath,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Disk => "disk",
            DeviceType::Part => "part",
            DeviceType::Mpath => "mpath",
        }
    }

    /// Parse the value reported by the local storage discovery daemon
    pub fn from_discovery(s: &str) -> Option<Self> {
        match s {
            "disk" => Some(DeviceType::Disk),
            "part" => Some(DeviceType::Part),
            "mpath" => Some(DeviceType::Mpath),
            _ => None,
        }
    }
}

/// Volume mode of the local PVs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiskMode {
    #[default]
    Block,
}

impl DiskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskMode::Block => "Block",
        }
    }
}

/// Size unit of the local device filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiskSizeUnit {
    #[default]
    Gi,
    Ti,
}

impl DiskSizeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskSizeUnit::Gi => "Gi",
            DiskSizeUnit::Ti => "Ti",
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            DiskSizeUnit::Gi => 1 << 30,
            DiskSizeUnit::Ti => 1 << 40,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DiskSizeUnit::Gi => DiskSizeUnit::Ti,
            DiskSizeUnit::Ti => DiskSizeUnit::Gi,
        }
    }
}

/// Key management service backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KmsProvider {
    #[default]
    Vault,
    Kmip,
}

impl KmsProvider {
    pub fn label(&self) -> &'static str {
        match self {
            KmsProvider::Vault => "Vault",
            KmsProvider::Kmip => "KMIP",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            KmsProvider::Vault => KmsProvider::Kmip,
            KmsProvider::Kmip => KmsProvider::Vault,
        }
    }
}

/// How the storage operators authenticate against Vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultAuthMethod {
    #[default]
    Token,
    Kubernetes,
}

impl VaultAuthMethod {
    pub fn toggle(&self) -> Self {
        match self {
            VaultAuthMethod::Token => VaultAuthMethod::Kubernetes,
            VaultAuthMethod::Kubernetes => VaultAuthMethod::Token,
        }
    }
}

/// Platform the cluster runs on, from `Infrastructure/cluster`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InfrastructureType {
    #[serde(rename = "AWS")]
    Aws,
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
    BareMetal,
    VSphere,
    OpenStack,
    #[default]
    None,
    Other(String),
}

impl InfrastructureType {
    pub fn from_platform(platform: &str) -> Self {
        match platform {
            "AWS" => InfrastructureType::Aws,
            "Azure" => InfrastructureType::Azure,
            "GCP" => InfrastructureType::Gcp,
            "BareMetal" => InfrastructureType::BareMetal,
            "VSphere" => InfrastructureType::VSphere,
            "OpenStack" => InfrastructureType::OpenStack,
            "None" | "" => InfrastructureType::None,
            other => InfrastructureType::Other(other.to_string()),
        }
    }

    /// Platforms whose default storage classes provision cloud volumes
    pub fn is_cloud(&self) -> bool {
        matches!(
            self,
            InfrastructureType::Aws | InfrastructureType::Azure | InfrastructureType::Gcp
        )
    }
}

impl std::fmt::Display for InfrastructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfrastructureType::Aws => write!(f, "AWS"),
            InfrastructureType::Azure => write!(f, "Azure"),
            InfrastructureType::Gcp => write!(f, "GCP"),
            InfrastructureType::BareMetal => write!(f, "BareMetal"),
            InfrastructureType::VSphere => write!(f, "VSphere"),
            InfrastructureType::OpenStack => write!(f, "OpenStack"),
            InfrastructureType::None => write!(f, "None"),
            InfrastructureType::Other(s) => write!(f, "{}", s),
        }
    }
}
