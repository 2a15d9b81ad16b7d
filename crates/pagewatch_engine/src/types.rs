use std::fmt;

use pagewatch_core::{InstanceRef, TargetId, TargetInfo};
use serde::Deserialize;
use thiserror::Error;

/// Rendered state of one page at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PageSnapshot {
    pub title: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: html.into(),
        }
    }

    /// Builds a snapshot from markup alone, taking the title from `<title>`.
    pub fn from_html(html: impl Into<String>) -> Self {
        let html = html.into();
        let title = crate::sampler::document_title(&html).unwrap_or_default();
        Self { title, html }
    }
}

/// Elements considered safe to poke with synthetic input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeTarget {
    AppBar,
    Header,
    Body,
}

impl SafeTarget {
    pub fn selector(self) -> &'static str {
        match self {
            SafeTarget::AppBar => r#"[data-tid*="app-bar"]"#,
            SafeTarget::Header => "header",
            SafeTarget::Body => "body",
        }
    }
}

/// One synthetic input event performed inside a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticInput {
    ScrollBy { dy: i32 },
    MouseEnter { target: SafeTarget },
    MouseMove { x: u32, y: u32 },
    KeyDown { key: &'static str, code: &'static str },
    KeyUp { key: &'static str, code: &'static str },
    /// Click `offset` pixels inside the target's top-left corner.
    Click { target: SafeTarget, offset: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostChange {
    Activated,
    Navigated(TargetInfo),
    Closed(TargetId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TargetsListed(Vec<TargetInfo>),
    Liveness { instance: InstanceRef, alive: bool },
    Host(HostChange),
    /// Ctrl-C reached the engine runtime.
    InterruptRequested,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("target {0} not found")]
    TargetNotFound(TargetId),
    #[error("host unreachable: {0}")]
    Unreachable(String),
    #[error("host returned http status {0}")]
    HttpStatus(u16),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("page script failed: {0}")]
    Script(String),
    #[error("timed out waiting for the page")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("failed to encode event: {0}")]
    Encode(String),
    #[error("sink returned http status {0}")]
    HttpStatus(u16),
    #[error("sink request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// Reasons an install/stop request could not reach its instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("instance {0} is not attached")]
    NotAttached(InstanceRef),
}

/// Failures building the engine's HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("devtools client: {0}")]
    Host(#[from] HostError),
    #[error("sink client: {0}")]
    Sink(#[from] DeliveryError),
}

impl fmt::Display for SafeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}
