//! Keep-alive action planning: which input to synthesize, against what, and when.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use scraper::{Html, Selector};

use crate::{PageSnapshot, SafeTarget, SyntheticInput};

/// Bounds of the re-arm delay in milliseconds, upper bound exclusive.
pub const KEEP_ALIVE_DELAY_MS: Range<u64> = 10_000..30_000;
pub const SCROLL_REVERT_DELAY: Duration = Duration::from_millis(100);
pub const KEY_RELEASE_DELAY: Duration = Duration::from_millis(50);
const CLICK_OFFSET_PX: u32 = 5;
const MOUSEMOVE_SPAN_PX: u32 = 10;
const SHIFT_KEY: &str = "Shift";
const SHIFT_CODE: &str = "ShiftLeft";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Scroll,
    Hover,
    MouseMove,
    KeyPress,
    Click,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Scroll,
        ActionKind::Hover,
        ActionKind::MouseMove,
        ActionKind::KeyPress,
        ActionKind::Click,
    ];

    /// Hover and click aim at a page element and need a snapshot to pick it.
    pub fn needs_target(self) -> bool {
        matches!(self, ActionKind::Hover | ActionKind::Click)
    }
}

/// One input of a plan, performed after waiting `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionStep {
    pub delay: Duration,
    pub input: SyntheticInput,
}

impl ActionStep {
    fn now(input: SyntheticInput) -> Self {
        Self {
            delay: Duration::ZERO,
            input,
        }
    }

    fn after(delay: Duration, input: SyntheticInput) -> Self {
        Self { delay, input }
    }
}

pub struct ActivityPlanner<R> {
    rng: R,
    delay_ms: Range<u64>,
}

impl<R: Rng> ActivityPlanner<R> {
    pub fn new(rng: R) -> Self {
        Self::with_delay_range(rng, KEEP_ALIVE_DELAY_MS)
    }

    /// An empty range collapses to its start.
    pub fn with_delay_range(rng: R, delay_ms: Range<u64>) -> Self {
        Self { rng, delay_ms }
    }

    /// Uniformly random action kind.
    pub fn next_action(&mut self) -> ActionKind {
        let idx = self.rng.random_range(0..ActionKind::ALL.len());
        ActionKind::ALL
            .get(idx)
            .copied()
            .unwrap_or(ActionKind::Scroll)
    }

    /// Uniformly random re-arm delay.
    pub fn next_delay(&mut self) -> Duration {
        let ms = if self.delay_ms.is_empty() {
            self.delay_ms.start
        } else {
            self.rng.random_range(self.delay_ms.clone())
        };
        Duration::from_millis(ms)
    }

    /// Expands an action into timed input steps. An empty plan means the
    /// action has nothing safe to act on in this page.
    pub fn plan(&mut self, kind: ActionKind, snapshot: Option<&PageSnapshot>) -> Vec<ActionStep> {
        match kind {
            ActionKind::Scroll => vec![
                ActionStep::now(SyntheticInput::ScrollBy { dy: 1 }),
                ActionStep::after(SCROLL_REVERT_DELAY, SyntheticInput::ScrollBy { dy: -1 }),
            ],
            ActionKind::Hover => {
                let target = snapshot
                    .and_then(|snapshot| resolve_safe_target(snapshot, true))
                    .unwrap_or(SafeTarget::Body);
                vec![ActionStep::now(SyntheticInput::MouseEnter { target })]
            }
            ActionKind::MouseMove => {
                let x = self.rng.random_range(0..MOUSEMOVE_SPAN_PX);
                let y = self.rng.random_range(0..MOUSEMOVE_SPAN_PX);
                vec![ActionStep::now(SyntheticInput::MouseMove { x, y })]
            }
            ActionKind::KeyPress => vec![
                ActionStep::now(SyntheticInput::KeyDown {
                    key: SHIFT_KEY,
                    code: SHIFT_CODE,
                }),
                ActionStep::after(
                    KEY_RELEASE_DELAY,
                    SyntheticInput::KeyUp {
                        key: SHIFT_KEY,
                        code: SHIFT_CODE,
                    },
                ),
            ],
            ActionKind::Click => snapshot
                .and_then(|snapshot| resolve_safe_target(snapshot, false))
                .map(|target| {
                    vec![ActionStep::now(SyntheticInput::Click {
                        target,
                        offset: CLICK_OFFSET_PX,
                    })]
                })
                .unwrap_or_default(),
        }
    }
}

/// App bar, then header, then (if allowed) the body.
pub fn resolve_safe_target(snapshot: &PageSnapshot, allow_body: bool) -> Option<SafeTarget> {
    let document = Html::parse_document(&snapshot.html);
    let present = |target: SafeTarget| {
        Selector::parse(target.selector())
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    };

    if present(SafeTarget::AppBar) {
        Some(SafeTarget::AppBar)
    } else if present(SafeTarget::Header) {
        Some(SafeTarget::Header)
    } else if allow_body {
        Some(SafeTarget::Body)
    } else {
        None
    }
}
