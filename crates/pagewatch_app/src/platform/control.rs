//! Settings UI control channel over native messaging framing: a 4-byte
//! little-endian length followed by that many bytes of JSON.

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use pagewatch_core::{Msg, OrchestratorView, ToggleName};
use pagewatch_logging::{watch_debug, watch_info, watch_warn};
use serde::{Deserialize, Serialize};

use super::app::AppInput;

/// Browsers refuse larger native messages.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlRequest {
    KeepAliveToggle { enabled: bool },
    StatusAlertToggle { enabled: bool },
    RequestState,
}

impl ControlRequest {
    /// The orchestrator message this request carries, if any.
    pub fn toggle_msg(&self) -> Option<Msg> {
        match *self {
            ControlRequest::KeepAliveToggle { enabled } => Some(Msg::ToggleRequested {
                toggle: ToggleName::KeepAlive,
                enabled,
            }),
            ControlRequest::StatusAlertToggle { enabled } => Some(Msg::ToggleRequested {
                toggle: ToggleName::StatusAlert,
                enabled,
            }),
            ControlRequest::RequestState => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlReply {
    State {
        #[serde(rename = "keepAliveEnabled")]
        keep_alive_enabled: bool,
        #[serde(rename = "statusAlertEnabled")]
        status_alert_enabled: bool,
        monitoring: bool,
    },
}

impl ControlReply {
    pub fn state(view: &OrchestratorView) -> Self {
        ControlReply::State {
            keep_alive_enabled: view.keep_alive,
            status_alert_enabled: view.status_alert,
            monitoring: view.monitoring.is_some(),
        }
    }
}

/// Reads one frame. `Ok(None)` means the peer closed the stream between frames.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }

    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(Some(buffer))
}

pub fn write_message<W: Write>(writer: &mut W, reply: &ControlReply) -> io::Result<()> {
    let json = serde_json::to_vec(reply)?;
    let len = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "reply too large"))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}

/// Forwards control requests to the app until the stream ends or breaks.
/// Malformed JSON in a well-formed frame is skipped.
pub fn spawn_reader<R>(mut reader: R, tx: mpsc::Sender<AppInput>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || loop {
        let frame = match read_frame(&mut reader) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                watch_info!("Control channel closed");
                return;
            }
            Err(err) => {
                watch_warn!("Control channel failed: {}", err);
                return;
            }
        };

        match serde_json::from_slice::<ControlRequest>(&frame) {
            Ok(request) => {
                watch_debug!("Control request {:?}", request);
                if tx.send(AppInput::Control(request)).is_err() {
                    return;
                }
            }
            Err(err) => watch_warn!("Ignoring malformed control message: {}", err),
        }
    })
}
