use crate::{InstanceRef, TargetId, TargetInfo, ToggleName, Toggles};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Process start with the toggles read from the config store.
    Started { toggles: Toggles },
    /// Result of a host scan requested by `Effect::ScanTargets`.
    TargetsListed(Vec<TargetInfo>),
    /// Focus/activation changed in the host; re-validate the adopted instance.
    Activated,
    /// Result of `Effect::ProbeLiveness`.
    LivenessChecked { instance: InstanceRef, alive: bool },
    /// A target finished loading an address.
    NavigationCompleted(TargetInfo),
    /// A target disappeared from the host listing.
    TargetClosed(TargetId),
    /// Settings UI (or startup restore) asked to flip a feature.
    ToggleRequested { toggle: ToggleName, enabled: bool },
    /// Process is exiting.
    Shutdown,
}
