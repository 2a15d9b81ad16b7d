use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use pagewatch_core::{Effect, Msg, Toggles};
use pagewatch_engine::{EngineEvent, EngineHandle, HostChange};
use pagewatch_logging::{watch_debug, watch_error, watch_info};

use super::app::AppInput;
use super::persistence::ToggleStore;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Carries orchestrator effects out to the engine and the toggle store.
pub struct EffectRunner {
    engine: EngineHandle,
    store: ToggleStore,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: ToggleStore) -> Self {
        Self { engine, store }
    }

    /// `toggles` is the orchestrator's state after the update that produced
    /// `effects`; persisting writes the whole set.
    pub fn run(&self, effects: Vec<Effect>, toggles: Toggles) {
        for effect in effects {
            match effect {
                Effect::ScanTargets => self.engine.scan_targets(),
                Effect::ProbeLiveness(instance) => self.engine.probe_liveness(instance),
                Effect::Attach(instance) => self.engine.attach(instance),
                Effect::Install { instance, kind } => self.engine.install(instance, kind),
                Effect::Stop { instance, kind } => self.engine.stop(instance, kind),
                Effect::Teardown(instance) => self.engine.teardown(instance),
                Effect::PersistToggle { toggle, enabled } => match self.store.save(toggles) {
                    Ok(path) => watch_info!("Persisted {}={} to {:?}", toggle, enabled, path),
                    Err(err) => watch_error!("Failed to persist {}={}: {}", toggle, enabled, err),
                },
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    /// Forwards engine events to the app until the app goes away.
    pub fn spawn_event_loop(&self, tx: mpsc::Sender<AppInput>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.recv_timeout(EVENT_POLL_INTERVAL) {
                watch_debug!("Engine event {:?}", event);
                if tx.send(AppInput::Msg(map_event(event))).is_err() {
                    return;
                }
            }
        });
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TargetsListed(targets) => Msg::TargetsListed(targets),
        EngineEvent::Liveness { instance, alive } => Msg::LivenessChecked { instance, alive },
        EngineEvent::Host(HostChange::Activated) => Msg::Activated,
        EngineEvent::Host(HostChange::Navigated(info)) => Msg::NavigationCompleted(info),
        EngineEvent::Host(HostChange::Closed(target)) => Msg::TargetClosed(target),
        EngineEvent::InterruptRequested => Msg::Shutdown,
    }
}
