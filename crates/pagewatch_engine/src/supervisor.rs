use std::collections::HashMap;

use pagewatch_core::{InstallOutcome, InstanceRef, LoopKind, LoopRegistry};
use pagewatch_logging::{watch_debug, watch_info};
use tokio_util::sync::CancellationToken;

use crate::loops::{run_loop, LoopContext};
use crate::InjectError;

/// Loop bookkeeping for one attached page instance.
struct InstanceRuntime {
    registry: LoopRegistry,
    root: CancellationToken,
    tokens: HashMap<LoopKind, CancellationToken>,
}

impl InstanceRuntime {
    fn new() -> Self {
        Self {
            registry: LoopRegistry::new(),
            root: CancellationToken::new(),
            tokens: HashMap::new(),
        }
    }

    /// Cancels all loop tokens and returns the kinds that were running.
    fn shutdown(&mut self) -> Vec<LoopKind> {
        self.root.cancel();
        self.tokens.clear();
        self.registry.stop_all()
    }
}

/// Owns the loop tasks of every attached instance. Must be driven from
/// inside a tokio runtime, since installs spawn tasks.
pub struct LoopSupervisor {
    ctx: LoopContext,
    instances: HashMap<InstanceRef, InstanceRuntime>,
}

impl LoopSupervisor {
    pub fn new(ctx: LoopContext) -> Self {
        Self {
            ctx,
            instances: HashMap::new(),
        }
    }

    /// Returns false if the instance was already attached.
    pub fn attach(&mut self, instance: InstanceRef) -> bool {
        if self.instances.contains_key(&instance) {
            return false;
        }
        watch_info!("Attached to {}", instance);
        self.instances.insert(instance, InstanceRuntime::new());
        true
    }

    pub fn install(
        &mut self,
        instance: &InstanceRef,
        kind: LoopKind,
    ) -> Result<InstallOutcome, InjectError> {
        let runtime = self
            .instances
            .get_mut(instance)
            .ok_or_else(|| InjectError::NotAttached(instance.clone()))?;

        let outcome = runtime.registry.install(kind);
        if outcome.needs_spawn() {
            let token = runtime.root.child_token();
            runtime.tokens.insert(kind, token.clone());
            tokio::spawn(run_loop(
                kind,
                self.ctx.clone(),
                instance.target.clone(),
                token,
            ));
            watch_info!("Installed {} loop in {} ({:?})", kind, instance, outcome);
        } else {
            watch_debug!("{} loop already running in {}", kind, instance);
        }
        Ok(outcome)
    }

    /// Returns true if a running loop was cancelled.
    pub fn stop(&mut self, instance: &InstanceRef, kind: LoopKind) -> Result<bool, InjectError> {
        let runtime = self
            .instances
            .get_mut(instance)
            .ok_or_else(|| InjectError::NotAttached(instance.clone()))?;

        if let Some(token) = runtime.tokens.remove(&kind) {
            token.cancel();
        }
        let was_running = runtime.registry.stop(kind);
        if was_running {
            watch_info!("Stopped {} loop in {}", kind, instance);
        }
        Ok(was_running)
    }

    /// Cancels every loop of the instance and forgets it.
    pub fn teardown(&mut self, instance: &InstanceRef) -> bool {
        match self.instances.remove(instance) {
            Some(mut runtime) => {
                let stopped = runtime.shutdown();
                watch_info!("Tore down {}, stopped {:?}", instance, stopped);
                true
            }
            None => false,
        }
    }

    pub fn teardown_all(&mut self) -> usize {
        let count = self.instances.len();
        for (instance, mut runtime) in self.instances.drain() {
            let stopped = runtime.shutdown();
            watch_debug!("Tore down {}, stopped {:?}", instance, stopped);
        }
        count
    }

    pub fn is_attached(&self, instance: &InstanceRef) -> bool {
        self.instances.contains_key(instance)
    }

    pub fn running(&self, instance: &InstanceRef) -> Vec<LoopKind> {
        self.instances
            .get(instance)
            .map(|runtime| runtime.registry.running().collect())
            .unwrap_or_default()
    }
}

impl Drop for LoopSupervisor {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
