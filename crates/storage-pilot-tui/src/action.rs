//! Actions returned by components and handled by the app

/// UI-level actions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Tick,
    Resize(u16, u16),
    Quit,
    /// Reload the cluster inventory
    Refresh,
    /// Apply the reviewed plan to the cluster
    Submit,
}
