//! Pagewatch core: pure detectors, loop guards and the orchestrator state machine.
mod detector;
mod effect;
mod event;
mod msg;
mod pattern;
mod registry;
mod state;
mod toggle;
mod update;
mod view_model;

pub use detector::{CountDetector, PresenceDetector, INITIAL_COUNT};
pub use effect::Effect;
pub use event::{
    presence_message_text, unread_message_text, ChangeEvent, EventKind, PresenceLabel,
    COUNT_EVENT_TITLE, PRESENCE_EVENT_TITLE,
};
pub use msg::Msg;
pub use pattern::{AddressPattern, DEFAULT_ADDRESS_PATTERN};
pub use registry::{InstallOutcome, LoopKind, LoopRegistry};
pub use state::{InstanceRef, OrchestratorState, TargetId, TargetInfo};
pub use toggle::{ToggleName, Toggles};
pub use update::update;
pub use view_model::OrchestratorView;
