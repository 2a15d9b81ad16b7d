use crate::{InstanceRef, LoopKind, ToggleName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// List host targets and answer with `Msg::TargetsListed`.
    ScanTargets,
    /// Check the instance still exists and answer with `Msg::LivenessChecked`.
    ProbeLiveness(InstanceRef),
    /// Create the loop runtime for a freshly adopted instance.
    Attach(InstanceRef),
    Install { instance: InstanceRef, kind: LoopKind },
    Stop { instance: InstanceRef, kind: LoopKind },
    /// Cancel every loop of the instance and drop its runtime.
    Teardown(InstanceRef),
    PersistToggle { toggle: ToggleName, enabled: bool },
}
