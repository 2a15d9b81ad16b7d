use crate::TargetId;

/// Snapshot of orchestrator state reported to the settings UI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestratorView {
    pub monitoring: Option<TargetId>,
    pub keep_alive: bool,
    pub status_alert: bool,
}
