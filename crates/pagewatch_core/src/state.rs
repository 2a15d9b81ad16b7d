use std::fmt;

use crate::view_model::OrchestratorView;
use crate::{AddressPattern, Toggles};

/// Host-assigned identifier of a browser page target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page target as reported by the host listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub id: TargetId,
    pub url: String,
    pub title: String,
}

/// The adopted page instance. `epoch` is unique per adoption, so effects
/// addressed to a released instance can be told apart from the live one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceRef {
    pub target: TargetId,
    pub epoch: u64,
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.target, self.epoch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestratorState {
    pattern: AddressPattern,
    adopted: Option<InstanceRef>,
    toggles: Toggles,
    next_epoch: u64,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(pattern: AddressPattern) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }

    pub fn view(&self) -> OrchestratorView {
        OrchestratorView {
            monitoring: self.adopted.as_ref().map(|instance| instance.target.clone()),
            keep_alive: self.toggles.keep_alive,
            status_alert: self.toggles.status_alert,
        }
    }

    pub fn adopted(&self) -> Option<&InstanceRef> {
        self.adopted.as_ref()
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub(crate) fn pattern(&self) -> &AddressPattern {
        &self.pattern
    }

    pub(crate) fn toggles_mut(&mut self) -> &mut Toggles {
        &mut self.toggles
    }

    pub(crate) fn is_adopted(&self, instance: &InstanceRef) -> bool {
        self.adopted.as_ref() == Some(instance)
    }

    pub(crate) fn is_adopted_target(&self, target: &TargetId) -> bool {
        self.adopted
            .as_ref()
            .is_some_and(|instance| &instance.target == target)
    }

    /// Mints a new reference for `target` and makes it the adopted one.
    pub(crate) fn adopt(&mut self, target: TargetId) -> InstanceRef {
        self.next_epoch += 1;
        let instance = InstanceRef {
            target,
            epoch: self.next_epoch,
        };
        self.adopted = Some(instance.clone());
        instance
    }

    pub(crate) fn release(&mut self) -> Option<InstanceRef> {
        self.adopted.take()
    }
}
