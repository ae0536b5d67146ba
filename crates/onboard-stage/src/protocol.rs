//! Wire contract with the rendering surface.
//!
//! Outbound commands are JSON. Inbound traffic is mostly loose progress
//! strings from an untrusted, isolated context and is matched by substring
//! against fixed markers rather than a schema. Unknown or malformed payloads
//! are ignored, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Commands the host may issue to the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BridgeCommand {
    /// Retarget the camera and swap the active animation clip to the
    /// talking pose.
    SwitchToTalking,
}

/// Structured messages on the bridge. FIFO per sender; receivers tolerate
/// unknown `action` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BridgeMessage {
    Command {
        action: String,
    },
    Event {
        action: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Malformed bridge traffic. Always swallowed at the call site: the surface
/// must not be able to crash the host by emitting garbage.
#[derive(Error, Debug)]
#[error("unparseable bridge message: {0}")]
pub struct ProtocolParseError(pub String);

/// Marker substrings emitted by the surface's load pipeline.
const ERROR_MARKERS: &[&str] = &["Failed", "Fatal"];
const READY_MARKERS: &[&str] = &["Avatar loaded", "Scene ready"];
const PROGRESS_MARKER: &str = "Loading";

/// A classified signal from the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceSignal {
    /// Free-form load progress text.
    Progress(String),
    /// The avatar or scene finished loading.
    Ready(String),
    /// The surface reported a failure; shown to the user as a transient
    /// banner.
    Error(String),
}

/// Encode a command for the surface's message channel.
pub fn encode_command(command: BridgeCommand) -> String {
    // Unit-variant tagged enum; serialization cannot fail.
    serde_json::to_string(&command).unwrap_or_default()
}

/// Parse a structured bridge message.
pub fn parse_message(raw: &str) -> Result<BridgeMessage, ProtocolParseError> {
    serde_json::from_str(raw).map_err(|e| ProtocolParseError(e.to_string()))
}

/// Best-effort classification of a plain surface string. Strings matching no
/// marker are ignored.
pub fn classify_text(text: &str) -> Option<SurfaceSignal> {
    if ERROR_MARKERS.iter().any(|m| text.contains(m)) {
        Some(SurfaceSignal::Error(text.to_string()))
    } else if READY_MARKERS.iter().any(|m| text.contains(m)) {
        Some(SurfaceSignal::Ready(text.to_string()))
    } else if text.contains(PROGRESS_MARKER) {
        Some(SurfaceSignal::Progress(text.to_string()))
    } else {
        None
    }
}
