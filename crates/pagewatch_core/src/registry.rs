use std::collections::BTreeMap;
use std::fmt;

/// The loops that can be installed into one page instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoopKind {
    /// Unread-count monitor; always installed on adoption.
    Monitor,
    /// Activity simulator.
    KeepAlive,
    /// Presence monitor.
    Status,
}

impl LoopKind {
    pub const ALL: [LoopKind; 3] = [LoopKind::Monitor, LoopKind::KeepAlive, LoopKind::Status];

    pub fn as_str(self) -> &'static str {
        match self {
            LoopKind::Monitor => "monitor",
            LoopKind::KeepAlive => "keepalive",
            LoopKind::Status => "status",
        }
    }
}

impl fmt::Display for LoopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// First installation into this instance.
    Started,
    /// The loop had been stopped and runs again with fresh state.
    Restarted,
    /// Guard hit: the loop is already running, nothing to do.
    AlreadyRunning,
}

impl InstallOutcome {
    pub fn needs_spawn(self) -> bool {
        !matches!(self, InstallOutcome::AlreadyRunning)
    }
}

/// Per-instance installation guards. A kind present in the map has been
/// installed at least once; its state says whether its timer is live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopRegistry {
    slots: BTreeMap<LoopKind, LoopState>,
}

impl LoopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, kind: LoopKind) -> InstallOutcome {
        match self.slots.insert(kind, LoopState::Running) {
            None => InstallOutcome::Started,
            Some(LoopState::Stopped) => InstallOutcome::Restarted,
            Some(LoopState::Running) => InstallOutcome::AlreadyRunning,
        }
    }

    /// Marks the loop stopped. Returns true if it was running. The guard
    /// itself is kept.
    pub fn stop(&mut self, kind: LoopKind) -> bool {
        match self.slots.get_mut(&kind) {
            Some(state @ LoopState::Running) => {
                *state = LoopState::Stopped;
                true
            }
            Some(LoopState::Stopped) | None => false,
        }
    }

    /// Stops every running loop and returns the kinds that were running.
    pub fn stop_all(&mut self) -> Vec<LoopKind> {
        let mut stopped = Vec::new();
        for (kind, state) in &mut self.slots {
            if *state == LoopState::Running {
                *state = LoopState::Stopped;
                stopped.push(*kind);
            }
        }
        stopped
    }

    pub fn running(&self) -> impl Iterator<Item = LoopKind> + '_ {
        self.slots
            .iter()
            .filter(|(_, state)| **state == LoopState::Running)
            .map(|(kind, _)| *kind)
    }
}
