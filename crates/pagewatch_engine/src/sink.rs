use std::sync::Arc;
use std::time::Duration;

use pagewatch_core::ChangeEvent;
use pagewatch_logging::{watch_debug, watch_warn};
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;

use crate::DeliveryError;

pub const DEFAULT_SINK_URL: &str = "http://localhost:9876/notification";

#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub url: String,
    /// `None` leaves the request unbounded; delivery is detached either way.
    pub request_timeout: Option<Duration>,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SINK_URL.to_string(),
            request_timeout: None,
        }
    }
}

#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &ChangeEvent) -> Result<(), DeliveryError>;
}

/// Posts events as JSON to the local notification endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    settings: SinkSettings,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(settings: SinkSettings) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| DeliveryError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl NotificationSink for HttpSink {
    async fn deliver(&self, event: &ChangeEvent) -> Result<(), DeliveryError> {
        let body =
            serde_json::to_vec(event).map_err(|err| DeliveryError::Encode(err.to_string()))?;
        let response = self
            .client
            .post(&self.settings.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

/// Delivers `event` on a detached task. Failures are logged and the event is
/// dropped; the handle lets callers observe the outcome if they want to.
pub fn dispatch(
    sink: Arc<dyn NotificationSink>,
    event: ChangeEvent,
) -> JoinHandle<Result<(), DeliveryError>> {
    tokio::spawn(async move {
        let result = sink.deliver(&event).await;
        match &result {
            Ok(()) => watch_debug!("Delivered {:?} event count={}", event.kind, event.count),
            Err(err) => watch_warn!("Dropped {:?} event: {}", event.kind, err),
        }
        result
    })
}

fn map_reqwest_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        return DeliveryError::Timeout;
    }
    DeliveryError::Network(err.to_string())
}
