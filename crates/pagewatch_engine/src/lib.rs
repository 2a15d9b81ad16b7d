//! Pagewatch engine: page host access, samplers, per-instance loops and delivery.
mod activity;
mod engine;
mod host;
mod loops;
mod persist;
mod sampler;
mod sink;
mod supervisor;
mod types;
mod watcher;

pub use activity::{
    resolve_safe_target, ActionKind, ActionStep, ActivityPlanner, KEEP_ALIVE_DELAY_MS,
    KEY_RELEASE_DELAY, SCROLL_REVERT_DELAY,
};
pub use engine::{EngineConfig, EngineHandle};
pub use host::{input_script, DevToolsHost, DevToolsSettings, PageHost, DEFAULT_DEVTOOLS_URL};
pub use loops::{run_loop, system_clock, Clock, LoopContext, LoopTimings};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use sampler::{
    avatar_presence, bell_badge_count, probe_presence, title_count, unread_element_count,
    CountHeuristic, CountSampler, ParsedPage, PresenceHeuristic, PresenceSampler,
};
pub use sink::{dispatch, HttpSink, NotificationSink, SinkSettings, DEFAULT_SINK_URL};
pub use supervisor::LoopSupervisor;
pub use types::{
    DeliveryError, EngineEvent, HostChange, HostError, InjectError, PageSnapshot, SafeTarget,
    StartError, SyntheticInput,
};
pub use watcher::{diff_targets, TargetWatcher, DEFAULT_HOST_POLL_INTERVAL};
