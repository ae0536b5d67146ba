//! **RenderSurfaceBridge** — the host side of the render-surface channel.
//!
//! The rendering surface runs in an isolated, less-trusted execution context
//! the host does not otherwise control. Commands flow out as fire-and-forget
//! JSON; whatever comes back is classified defensively and folded into a
//! status the host can show (the transient error banner is the only
//! user-visible failure channel).

use crate::protocol::{
    classify_text, encode_command, parse_message, BridgeCommand, BridgeMessage, SurfaceSignal,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Folded lifecycle of the rendering surface, as seen from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceStatus {
    /// Still loading; carries the last progress text, if any.
    Loading(Option<String>),
    Ready,
    /// Failure reported by the surface; shown as a transient banner.
    Error(String),
}

/// Serializes commands into the surface's message channel and classifies the
/// lifecycle/error signals coming back.
pub struct RenderSurfaceBridge {
    outbound: mpsc::UnboundedSender<String>,
    status: SurfaceStatus,
}

impl RenderSurfaceBridge {
    /// Create a bridge. The embedder forwards strings from the returned
    /// receiver into the rendering surface's message channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound,
                status: SurfaceStatus::Loading(None),
            },
            rx,
        )
    }

    /// Fire-and-forget a command into the surface's channel.
    pub fn send(&self, command: BridgeCommand) {
        let encoded = encode_command(command);
        debug!("Bridge: sending {}", encoded);
        if self.outbound.send(encoded).is_err() {
            // Surface channel gone (teardown); commands are best-effort.
            warn!("Bridge: surface channel closed, command dropped");
        }
    }

    /// Classify one raw inbound message and fold it into the surface status.
    /// Returns `None` for malformed or unrecognized traffic; this path never
    /// fails, whatever the surface emits.
    pub fn on_message(&mut self, raw: &str) -> Option<SurfaceSignal> {
        let signal = match parse_message(raw) {
            Ok(BridgeMessage::Event { action, payload }) => {
                self.classify_event(&action, payload)?
            }
            Ok(BridgeMessage::Command { action }) => {
                // Commands flow host → surface; an echoed command is noise.
                debug!("Bridge: ignoring inbound command {:?}", action);
                return None;
            }
            Err(err) => {
                if looks_like_json(raw) {
                    debug!("Bridge: dropping malformed message: {}", err);
                    return None;
                }
                classify_text(raw)?
            }
        };
        self.apply(&signal);
        Some(signal)
    }

    /// Current folded surface status.
    pub fn status(&self) -> &SurfaceStatus {
        &self.status
    }

    fn classify_event(&self, action: &str, payload: Value) -> Option<SurfaceSignal> {
        match payload {
            Value::String(text) => classify_text(&text),
            _ => {
                debug!("Bridge: ignoring event with action {:?}", action);
                None
            }
        }
    }

    fn apply(&mut self, signal: &SurfaceSignal) {
        match signal {
            SurfaceSignal::Progress(text) => {
                if !matches!(self.status, SurfaceStatus::Ready) {
                    self.status = SurfaceStatus::Loading(Some(text.clone()));
                }
            }
            SurfaceSignal::Ready(text) => {
                info!("Bridge: surface ready ({})", text);
                self.status = SurfaceStatus::Ready;
            }
            SurfaceSignal::Error(text) => {
                warn!("Bridge: surface error ({})", text);
                self.status = SurfaceStatus::Error(text.clone());
            }
        }
    }
}

fn looks_like_json(raw: &str) -> bool {
    matches!(raw.trim_start().chars().next(), Some('{') | Some('['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_delivers_encoded_command() {
        let (bridge, mut rx) = RenderSurfaceBridge::new();
        bridge.send(BridgeCommand::SwitchToTalking);
        assert_eq!(rx.try_recv().unwrap(), r#"{"action":"switchToTalking"}"#);
    }

    #[test]
    fn send_after_surface_teardown_is_silent() {
        let (bridge, rx) = RenderSurfaceBridge::new();
        drop(rx);
        // Must not panic or error; commands are best-effort.
        bridge.send(BridgeCommand::SwitchToTalking);
    }

    #[test]
    fn ready_signal_clears_prior_error() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        assert_eq!(
            bridge.on_message("Failed to load avatar"),
            Some(SurfaceSignal::Error("Failed to load avatar".to_string()))
        );
        assert!(matches!(bridge.status(), SurfaceStatus::Error(_)));

        assert_eq!(
            bridge.on_message("Avatar loaded"),
            Some(SurfaceSignal::Ready("Avatar loaded".to_string()))
        );
        assert_eq!(bridge.status(), &SurfaceStatus::Ready);
    }

    #[test]
    fn progress_updates_loading_status() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        bridge.on_message("Loading avatar: 40%");
        assert_eq!(
            bridge.status(),
            &SurfaceStatus::Loading(Some("Loading avatar: 40%".to_string()))
        );
    }

    #[test]
    fn malformed_traffic_is_ignored_not_fatal() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        for raw in [
            "",
            "   ",
            "{\"unterminated",
            r#"{"kind":"mystery","action":"x"}"#,
            "[1, 2, 3]",
            "random chatter from the surface",
            "\u{0}\u{1}binary-ish",
        ] {
            assert_eq!(bridge.on_message(raw), None, "input {:?}", raw);
        }
        // Status untouched by garbage.
        assert_eq!(bridge.status(), &SurfaceStatus::Loading(None));
    }

    #[test]
    fn structured_event_with_string_payload_is_classified() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        let signal =
            bridge.on_message(r#"{"kind":"event","action":"status","payload":"Scene ready"}"#);
        assert_eq!(signal, Some(SurfaceSignal::Ready("Scene ready".to_string())));
        assert_eq!(bridge.status(), &SurfaceStatus::Ready);
    }

    #[test]
    fn unknown_event_actions_are_tolerated() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        let signal =
            bridge.on_message(r#"{"kind":"event","action":"telemetry","payload":{"fps":60}}"#);
        assert_eq!(signal, None);
    }

    #[test]
    fn inbound_commands_are_ignored() {
        let (mut bridge, _rx) = RenderSurfaceBridge::new();
        assert_eq!(
            bridge.on_message(r#"{"kind":"command","action":"switchToTalking"}"#),
            None
        );
    }
}
