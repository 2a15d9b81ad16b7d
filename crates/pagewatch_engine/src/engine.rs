use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use pagewatch_core::{InstanceRef, LoopKind};
use pagewatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::host::{DevToolsHost, DevToolsSettings, PageHost};
use crate::loops::{system_clock, Clock, LoopContext, LoopTimings};
use crate::sink::{HttpSink, NotificationSink, SinkSettings};
use crate::supervisor::LoopSupervisor;
use crate::watcher::{TargetWatcher, DEFAULT_HOST_POLL_INTERVAL};
use crate::{EngineEvent, StartError};

#[derive(Clone)]
pub struct EngineConfig {
    pub devtools: DevToolsSettings,
    pub sink: SinkSettings,
    pub timings: LoopTimings,
    pub host_poll_interval: Duration,
    pub clock: Clock,
    /// Forward Ctrl-C as `EngineEvent::InterruptRequested`.
    pub handle_interrupts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            devtools: DevToolsSettings::default(),
            sink: SinkSettings::default(),
            timings: LoopTimings::default(),
            host_poll_interval: DEFAULT_HOST_POLL_INTERVAL,
            clock: system_clock(),
            handle_interrupts: true,
        }
    }
}

enum EngineCommand {
    ScanTargets,
    ProbeLiveness(InstanceRef),
    Attach(InstanceRef),
    Install { instance: InstanceRef, kind: LoopKind },
    Stop { instance: InstanceRef, kind: LoopKind },
    Teardown(InstanceRef),
    Shutdown,
}

/// Runs the engine on its own thread and tokio runtime. Commands go in
/// through the handle, results come back as [`EngineEvent`]s.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, StartError> {
        let host = Arc::new(DevToolsHost::new(config.devtools.clone())?);
        let sink = Arc::new(HttpSink::new(config.sink.clone())?);
        Ok(Self::with_parts(host, sink, config))
    }

    pub fn with_parts(
        host: Arc<dyn PageHost>,
        sink: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    watch_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(run_engine(host, sink, config, cmd_rx, event_tx));
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn scan_targets(&self) {
        self.send(EngineCommand::ScanTargets);
    }

    pub fn probe_liveness(&self, instance: InstanceRef) {
        self.send(EngineCommand::ProbeLiveness(instance));
    }

    pub fn attach(&self, instance: InstanceRef) {
        self.send(EngineCommand::Attach(instance));
    }

    pub fn install(&self, instance: InstanceRef, kind: LoopKind) {
        self.send(EngineCommand::Install { instance, kind });
    }

    pub fn stop(&self, instance: InstanceRef, kind: LoopKind) {
        self.send(EngineCommand::Stop { instance, kind });
    }

    pub fn teardown(&self, instance: InstanceRef) {
        self.send(EngineCommand::Teardown(instance));
    }

    /// Tears down every instance and stops the engine thread.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            watch_debug!("Engine is gone; command dropped");
        }
    }
}

async fn run_engine(
    host: Arc<dyn PageHost>,
    sink: Arc<dyn NotificationSink>,
    config: EngineConfig,
    mut cmd_rx: UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let shutdown = CancellationToken::new();

    let watcher = TargetWatcher::new(host.clone(), config.host_poll_interval);
    tokio::spawn(watcher.run(event_tx.clone(), shutdown.child_token()));
    if config.handle_interrupts {
        tokio::spawn(forward_interrupts(event_tx.clone(), shutdown.child_token()));
    }

    let mut supervisor = LoopSupervisor::new(LoopContext {
        host: host.clone(),
        sink,
        clock: config.clock.clone(),
        timings: config.timings.clone(),
    });

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::ScanTargets => {
                let host = host.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    match host.list_targets().await {
                        Ok(targets) => {
                            let _ = event_tx.send(EngineEvent::TargetsListed(targets));
                        }
                        Err(err) => watch_debug!("Target scan failed: {}", err),
                    }
                });
            }
            EngineCommand::ProbeLiveness(instance) => {
                let host = host.clone();
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let alive = match host.is_alive(&instance.target).await {
                        Ok(alive) => alive,
                        Err(err) => {
                            watch_debug!("Liveness probe of {} failed: {}", instance, err);
                            false
                        }
                    };
                    let _ = event_tx.send(EngineEvent::Liveness { instance, alive });
                });
            }
            EngineCommand::Attach(instance) => {
                supervisor.attach(instance);
            }
            EngineCommand::Install { instance, kind } => {
                if let Err(err) = supervisor.install(&instance, kind) {
                    watch_warn!("Install of {} loop failed: {}", kind, err);
                }
            }
            EngineCommand::Stop { instance, kind } => {
                if let Err(err) = supervisor.stop(&instance, kind) {
                    watch_warn!("Stop of {} loop failed: {}", kind, err);
                }
            }
            EngineCommand::Teardown(instance) => {
                supervisor.teardown(&instance);
            }
            EngineCommand::Shutdown => {
                let count = supervisor.teardown_all();
                watch_info!("Engine shutting down; tore down {} instance(s)", count);
                break;
            }
        }
    }

    shutdown.cancel();
}

async fn forward_interrupts(event_tx: mpsc::Sender<EngineEvent>, cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                let _ = event_tx.send(EngineEvent::InterruptRequested);
            }
            Err(err) => watch_warn!("Cannot listen for Ctrl-C: {}", err),
        },
    }
}
