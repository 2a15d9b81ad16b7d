use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pagewatch_core::{TargetId, TargetInfo};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::{HostError, PageSnapshot, SyntheticInput};

pub const DEFAULT_DEVTOOLS_URL: &str = "http://127.0.0.1:9222";

/// Reads the page's title and markup in one round trip.
const SNAPSHOT_SCRIPT: &str =
    "JSON.stringify({title: document.title, html: document.documentElement.outerHTML})";
const EVALUATE_ID: u64 = 1;

/// Access to the browser's page instances.
#[async_trait::async_trait]
pub trait PageHost: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<TargetInfo>, HostError>;

    async fn is_alive(&self, target: &TargetId) -> Result<bool, HostError> {
        let targets = self.list_targets().await?;
        Ok(targets.iter().any(|info| &info.id == target))
    }

    async fn snapshot(&self, target: &TargetId) -> Result<PageSnapshot, HostError>;

    async fn dispatch(&self, target: &TargetId, input: &SyntheticInput) -> Result<(), HostError>;
}

#[derive(Debug, Clone)]
pub struct DevToolsSettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for DevToolsSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DEVTOOLS_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevToolsTarget {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    web_socket_debugger_url: Option<String>,
}

/// Chrome DevTools Protocol host: HTTP listing plus `Runtime.evaluate` over
/// each target's debugger WebSocket.
#[derive(Debug, Clone)]
pub struct DevToolsHost {
    settings: DevToolsSettings,
    client: reqwest::Client,
}

impl DevToolsHost {
    pub fn new(settings: DevToolsSettings) -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| HostError::Unreachable(err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn page_targets(&self) -> Result<Vec<DevToolsTarget>, HostError> {
        let url = format!("{}/json/list", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostError::HttpStatus(status.as_u16()));
        }
        let body = response.text().await.map_err(map_reqwest_error)?;
        let targets: Vec<DevToolsTarget> =
            serde_json::from_str(&body).map_err(|err| HostError::Protocol(err.to_string()))?;
        Ok(targets
            .into_iter()
            .filter(|target| target.kind == "page")
            .collect())
    }

    async fn debugger_url(&self, target: &TargetId) -> Result<String, HostError> {
        self.page_targets()
            .await?
            .into_iter()
            .find(|candidate| candidate.id == target.as_str())
            .and_then(|candidate| candidate.web_socket_debugger_url)
            .ok_or_else(|| HostError::TargetNotFound(target.clone()))
    }

    async fn evaluate(&self, target: &TargetId, expression: &str) -> Result<Value, HostError> {
        let ws_url = self.debugger_url(target).await?;
        tokio::time::timeout(self.settings.request_timeout, evaluate_over(&ws_url, expression))
            .await
            .map_err(|_| HostError::Timeout)?
    }
}

#[async_trait::async_trait]
impl PageHost for DevToolsHost {
    async fn list_targets(&self) -> Result<Vec<TargetInfo>, HostError> {
        Ok(self
            .page_targets()
            .await?
            .into_iter()
            .map(|target| TargetInfo {
                id: TargetId::new(target.id),
                url: target.url,
                title: target.title,
            })
            .collect())
    }

    async fn snapshot(&self, target: &TargetId) -> Result<PageSnapshot, HostError> {
        let value = self.evaluate(target, SNAPSHOT_SCRIPT).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| HostError::Protocol("snapshot was not a string".to_string()))?;
        serde_json::from_str(raw).map_err(|err| HostError::Protocol(err.to_string()))
    }

    async fn dispatch(&self, target: &TargetId, input: &SyntheticInput) -> Result<(), HostError> {
        self.evaluate(target, &input_script(input)).await.map(|_| ())
    }
}

async fn evaluate_over(ws_url: &str, expression: &str) -> Result<Value, HostError> {
    let (mut ws, _) = connect_async(ws_url)
        .await
        .map_err(|err| HostError::Unreachable(err.to_string()))?;

    let request = json!({
        "id": EVALUATE_ID,
        "method": "Runtime.evaluate",
        "params": { "expression": expression, "returnByValue": true },
    });
    ws.send(Message::Text(request.to_string().into()))
        .await
        .map_err(|err| HostError::Protocol(err.to_string()))?;

    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|err| HostError::Protocol(err.to_string()))?;
        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Binary(b) => String::from_utf8_lossy(&b).to_string(),
            Message::Ping(v) => {
                let _ = ws.send(Message::Pong(v)).await;
                continue;
            }
            Message::Pong(_) | Message::Frame(_) => continue,
            Message::Close(_) => break,
        };

        let Ok(payload) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        // Skip protocol events and replies to other ids.
        if payload.get("id").and_then(Value::as_u64) != Some(EVALUATE_ID) {
            continue;
        }
        let _ = ws.close(None).await;
        return evaluation_result(&payload);
    }

    Err(HostError::Protocol(
        "connection closed before the evaluation reply".to_string(),
    ))
}

fn evaluation_result(payload: &Value) -> Result<Value, HostError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown protocol error");
        return Err(HostError::Protocol(message.to_string()));
    }
    let result = payload.get("result").unwrap_or(&Value::Null);
    if let Some(details) = result.get("exceptionDetails") {
        let text = details
            .get("exception")
            .and_then(|exception| exception.get("description"))
            .or_else(|| details.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("uncaught exception");
        return Err(HostError::Script(text.to_string()));
    }
    Ok(result
        .get("result")
        .and_then(|remote| remote.get("value"))
        .cloned()
        .unwrap_or(Value::Null))
}

/// JavaScript performing one synthetic input inside the page.
pub fn input_script(input: &SyntheticInput) -> String {
    match input {
        SyntheticInput::ScrollBy { dy } => format!("window.scrollBy(0, {dy}); true"),
        SyntheticInput::MouseEnter { target } => format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             el.dispatchEvent(new MouseEvent('mouseenter', {{bubbles: true, cancelable: true}})); \
             return true; }})()",
            sel = js_string(target.selector()),
        ),
        SyntheticInput::MouseMove { x, y } => format!(
            "document.dispatchEvent(new MouseEvent('mousemove', \
             {{bubbles: true, cancelable: true, clientX: {x}, clientY: {y}}})); true"
        ),
        SyntheticInput::KeyDown { key, code } => key_script("keydown", key, code),
        SyntheticInput::KeyUp { key, code } => key_script("keyup", key, code),
        SyntheticInput::Click { target, offset } => format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             const r = el.getBoundingClientRect(); \
             el.dispatchEvent(new MouseEvent('click', {{bubbles: true, cancelable: true, \
             clientX: r.left + {offset}, clientY: r.top + {offset}}})); return true; }})()",
            sel = js_string(target.selector()),
        ),
    }
}

fn key_script(event: &str, key: &str, code: &str) -> String {
    format!(
        "document.dispatchEvent(new KeyboardEvent('{event}', \
         {{key: {key}, code: {code}, bubbles: true, cancelable: true}})); true",
        key = js_string(key),
        code = js_string(code),
    )
}

fn js_string(raw: &str) -> String {
    Value::String(raw.to_string()).to_string()
}

fn map_reqwest_error(err: reqwest::Error) -> HostError {
    if err.is_timeout() {
        return HostError::Timeout;
    }
    HostError::Unreachable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SafeTarget;

    #[test]
    fn selectors_are_embedded_as_js_literals() {
        let script = input_script(&SyntheticInput::MouseEnter {
            target: SafeTarget::AppBar,
        });
        assert!(script.contains(r#"document.querySelector("[data-tid*=\"app-bar\"]")"#));
        assert!(script.contains("'mouseenter'"));
    }

    #[test]
    fn key_scripts_name_the_event() {
        let script = input_script(&SyntheticInput::KeyUp {
            key: "Shift",
            code: "ShiftLeft",
        });
        assert!(script.contains("'keyup'"));
        assert!(script.contains(r#"key: "Shift""#));
    }

    #[test]
    fn evaluation_exception_is_a_script_error() {
        let payload = json!({
            "id": 1,
            "result": {
                "result": {"type": "object"},
                "exceptionDetails": {"text": "Uncaught", "exception": {"description": "ReferenceError: x"}}
            }
        });
        assert_eq!(
            evaluation_result(&payload),
            Err(HostError::Script("ReferenceError: x".to_string()))
        );
    }

    #[test]
    fn evaluation_value_is_unwrapped() {
        let payload = json!({"id": 1, "result": {"result": {"type": "string", "value": "ok"}}});
        assert_eq!(evaluation_result(&payload), Ok(Value::String("ok".to_string())));
    }
}
