use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context;
use pagewatch_core::{update, Msg, OrchestratorState};
use pagewatch_engine::{ensure_state_dir, EngineHandle};
use pagewatch_logging::{watch_debug, watch_info};

use super::control::{self, ControlReply, ControlRequest};
use super::effects::EffectRunner;
use super::persistence::ToggleStore;
use super::settings::load_settings;

/// Everything the dispatch loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppInput {
    Msg(Msg),
    Control(ControlRequest),
}

pub fn run_app(settings_path: Option<PathBuf>) -> anyhow::Result<()> {
    let resolved = load_settings(settings_path.as_deref()).context("loading settings")?;
    let settings = resolved.settings;
    ensure_state_dir(&resolved.state_dir)
        .with_context(|| format!("preparing state directory {:?}", resolved.state_dir))?;
    pagewatch_logging::initialize(
        settings.log_destination.into(),
        settings.level(),
        Some(&resolved.state_dir),
    );
    watch_info!(
        "pagewatch starting; watching '{}' via {}, state in {:?}",
        settings.address_pattern,
        settings.devtools_url,
        resolved.state_dir
    );

    let store = ToggleStore::new(resolved.state_dir.clone());
    let toggles = store.load();
    let engine = EngineHandle::new(settings.engine_config()).context("starting engine")?;

    let (tx, rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, store);
    runner.spawn_event_loop(tx.clone());
    control::spawn_reader(io::stdin(), tx);

    let mut daemon = Daemon::new(
        OrchestratorState::with_pattern(settings.pattern()),
        runner,
        Box::new(io::stdout()),
    );
    daemon.dispatch(Msg::Started { toggles });
    while let Ok(input) = rx.recv() {
        if !daemon.handle(input) {
            break;
        }
    }

    watch_info!("pagewatch stopped");
    Ok(())
}

/// Owns the orchestrator state; the only place `update` runs.
struct Daemon {
    state: OrchestratorState,
    runner: EffectRunner,
    control_out: Box<dyn Write + Send>,
}

impl Daemon {
    fn new(
        state: OrchestratorState,
        runner: EffectRunner,
        control_out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            state,
            runner,
            control_out,
        }
    }

    /// Returns false once the daemon should exit.
    fn handle(&mut self, input: AppInput) -> bool {
        match input {
            AppInput::Msg(Msg::Shutdown) => {
                self.dispatch(Msg::Shutdown);
                self.runner.shutdown();
                false
            }
            AppInput::Msg(msg) => {
                self.dispatch(msg);
                true
            }
            AppInput::Control(request) => {
                if let Some(msg) = request.toggle_msg() {
                    self.dispatch(msg);
                }
                self.reply_state();
                true
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if !effects.is_empty() {
            watch_debug!("Running effects {:?}", effects);
        }
        self.runner.run(effects, self.state.toggles());
    }

    fn reply_state(&mut self) {
        let reply = ControlReply::state(&self.state.view());
        if let Err(err) = control::write_message(&mut self.control_out, &reply) {
            watch_debug!("State reply not delivered: {}", err);
        }
    }
}
