//! Turns periodic host listings into activation, navigation and close events.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use pagewatch_core::{TargetId, TargetInfo};
use pagewatch_logging::{watch_debug, watch_trace};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, HostChange, PageHost};

pub const DEFAULT_HOST_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Differences between two listings: closures first, then navigations in
/// listing order, then one activation for the poll itself.
pub fn diff_targets(previous: &[TargetInfo], next: &[TargetInfo]) -> Vec<HostChange> {
    let known: HashMap<&TargetId, &TargetInfo> =
        previous.iter().map(|info| (&info.id, info)).collect();

    let mut changes: Vec<HostChange> = previous
        .iter()
        .filter(|old| !next.iter().any(|info| info.id == old.id))
        .map(|old| HostChange::Closed(old.id.clone()))
        .collect();

    for info in next {
        let navigated = match known.get(&info.id) {
            Some(old) => old.url != info.url,
            None => !info.url.is_empty(),
        };
        if navigated {
            changes.push(HostChange::Navigated(info.clone()));
        }
    }

    changes.push(HostChange::Activated);
    changes
}

pub struct TargetWatcher {
    host: Arc<dyn PageHost>,
    interval: Duration,
    known: Option<Vec<TargetInfo>>,
}

impl TargetWatcher {
    pub fn new(host: Arc<dyn PageHost>, interval: Duration) -> Self {
        Self {
            host,
            interval,
            known: None,
        }
    }

    /// Records a listing. The first one only establishes the baseline.
    pub fn observe(&mut self, listing: Vec<TargetInfo>) -> Vec<HostChange> {
        let changes = match &self.known {
            Some(previous) => diff_targets(previous, &listing),
            None => Vec::new(),
        };
        self.known = Some(listing);
        changes
    }

    pub async fn run(mut self, events: mpsc::Sender<EngineEvent>, cancel: CancellationToken) {
        loop {
            let listing = tokio::select! {
                _ = cancel.cancelled() => break,
                listing = self.host.list_targets() => listing,
            };

            match listing {
                Ok(listing) => {
                    for change in self.observe(listing) {
                        watch_trace!("Host change {:?}", change);
                        if events.send(EngineEvent::Host(change)).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => watch_debug!("Host listing failed: {}", err),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
