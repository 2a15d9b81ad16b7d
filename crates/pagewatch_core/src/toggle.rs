use std::fmt;

use crate::LoopKind;

/// User-controlled features backed by the config store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleName {
    KeepAlive,
    StatusAlert,
}

impl ToggleName {
    pub const ALL: [ToggleName; 2] = [ToggleName::KeepAlive, ToggleName::StatusAlert];

    /// The loop this toggle switches on and off.
    pub fn loop_kind(self) -> LoopKind {
        match self {
            ToggleName::KeepAlive => LoopKind::KeepAlive,
            ToggleName::StatusAlert => LoopKind::Status,
        }
    }

    /// Key under which the flag is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            ToggleName::KeepAlive => "keepAliveEnabled",
            ToggleName::StatusAlert => "statusAlertEnabled",
        }
    }
}

impl fmt::Display for ToggleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toggles {
    pub keep_alive: bool,
    pub status_alert: bool,
}

impl Toggles {
    pub fn get(&self, name: ToggleName) -> bool {
        match name {
            ToggleName::KeepAlive => self.keep_alive,
            ToggleName::StatusAlert => self.status_alert,
        }
    }

    pub fn set(&mut self, name: ToggleName, enabled: bool) {
        match name {
            ToggleName::KeepAlive => self.keep_alive = enabled,
            ToggleName::StatusAlert => self.status_alert = enabled,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = ToggleName> + '_ {
        ToggleName::ALL.into_iter().filter(|name| self.get(*name))
    }
}
