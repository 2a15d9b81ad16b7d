//! The three per-instance loops. Each runs until its token is cancelled and
//! performs its first tick immediately.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pagewatch_core::{CountDetector, LoopKind, PresenceDetector, TargetId};
use pagewatch_logging::{watch_debug, watch_info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityPlanner, KEEP_ALIVE_DELAY_MS};
use crate::sampler::{CountSampler, PresenceSampler};
use crate::sink::{self, NotificationSink};
use crate::PageHost;

/// Milliseconds since the Unix epoch, stamped onto emitted events.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().timestamp_millis())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopTimings {
    pub count_interval: Duration,
    pub presence_interval: Duration,
    pub keep_alive_delay_ms: Range<u64>,
}

impl Default for LoopTimings {
    fn default() -> Self {
        Self {
            count_interval: Duration::from_secs(2),
            presence_interval: Duration::from_secs(5),
            keep_alive_delay_ms: KEEP_ALIVE_DELAY_MS,
        }
    }
}

/// What every loop of every instance shares.
#[derive(Clone)]
pub struct LoopContext {
    pub host: Arc<dyn PageHost>,
    pub sink: Arc<dyn NotificationSink>,
    pub clock: Clock,
    pub timings: LoopTimings,
}

pub async fn run_loop(
    kind: LoopKind,
    ctx: LoopContext,
    target: TargetId,
    cancel: CancellationToken,
) {
    watch_debug!("Loop {} started on {}", kind, target);
    match kind {
        LoopKind::Monitor => count_loop(&ctx, &target, &cancel).await,
        LoopKind::Status => presence_loop(&ctx, &target, &cancel).await,
        LoopKind::KeepAlive => keep_alive_loop(&ctx, &target, &cancel).await,
    }
    watch_debug!("Loop {} finished on {}", kind, target);
}

async fn count_loop(ctx: &LoopContext, target: &TargetId, cancel: &CancellationToken) {
    let sampler = CountSampler::new();
    let mut detector = CountDetector::new();

    loop {
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => return,
            snapshot = ctx.host.snapshot(target) => snapshot,
        };
        match snapshot {
            Ok(snapshot) => {
                let count = sampler.sample(&snapshot);
                if let Some(event) = detector.observe(count, (ctx.clock)()) {
                    watch_info!(
                        "Unread count on {}: {:?} -> {}",
                        target,
                        event.previous_count,
                        event.count
                    );
                    sink::dispatch(ctx.sink.clone(), event);
                }
            }
            Err(err) => watch_debug!("Count sample on {} skipped: {}", target, err),
        }

        if !pause(cancel, ctx.timings.count_interval).await {
            return;
        }
    }
}

async fn presence_loop(ctx: &LoopContext, target: &TargetId, cancel: &CancellationToken) {
    let sampler = PresenceSampler::new();
    let mut detector = PresenceDetector::new();

    loop {
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => return,
            snapshot = ctx.host.snapshot(target) => snapshot,
        };
        match snapshot {
            Ok(snapshot) => {
                let label = sampler.sample(&snapshot);
                if let Some(event) = detector.observe(label, (ctx.clock)()) {
                    watch_info!("Presence on {} changed to {}", target, label.as_str());
                    sink::dispatch(ctx.sink.clone(), event);
                }
            }
            Err(err) => watch_debug!("Presence sample on {} skipped: {}", target, err),
        }

        if !pause(cancel, ctx.timings.presence_interval).await {
            return;
        }
    }
}

async fn keep_alive_loop(ctx: &LoopContext, target: &TargetId, cancel: &CancellationToken) {
    let mut planner = ActivityPlanner::with_delay_range(
        StdRng::from_os_rng(),
        ctx.timings.keep_alive_delay_ms.clone(),
    );

    loop {
        let kind = planner.next_action();
        let snapshot = if kind.needs_target() {
            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return,
                snapshot = ctx.host.snapshot(target) => snapshot,
            };
            match snapshot {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    watch_debug!("Keep-alive snapshot on {} failed: {}", target, err);
                    None
                }
            }
        } else {
            None
        };

        let steps = planner.plan(kind, snapshot.as_ref());
        if steps.is_empty() {
            watch_debug!("Keep-alive {:?} on {} had no safe target", kind, target);
        }
        // Once the first input is out, the plan runs to the end so a scroll is
        // reverted and a pressed key released even if the loop was stopped.
        let mut committed = false;
        for step in steps {
            if !step.delay.is_zero() {
                if committed {
                    tokio::time::sleep(step.delay).await;
                } else if !pause(cancel, step.delay).await {
                    return;
                }
            }
            let result = if committed {
                ctx.host.dispatch(target, &step.input).await
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = ctx.host.dispatch(target, &step.input) => result,
                }
            };
            if let Err(err) = result {
                watch_debug!("Keep-alive input {:?} on {} failed: {}", step.input, target, err);
                break;
            }
            committed = true;
        }

        let delay = planner.next_delay();
        if !pause(cancel, delay).await {
            return;
        }
    }
}

/// Sleeps for `delay`. Returns false if the token was cancelled first.
async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
