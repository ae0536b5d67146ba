//! # onboard-stage — Render-Surface Control Protocol
//!
//! Host side of the message contract with the isolated 3D rendering surface:
//! command state changes in (camera pose, active animation clip) and receive
//! lifecycle/error signals back.
//!
//! The surface runs in a less-trusted, host-uncontrolled context, so inbound
//! traffic is parsed defensively: malformed payloads are dropped, unknown
//! actions are ignored, and plain strings are matched by substring against
//! fixed markers. Nothing the surface emits can make the host fail.

pub mod assets;
pub mod protocol;
pub mod surface;

pub use assets::{
    avatar_model_url, AVATAR_MODEL_HOST, IDLE_ANIMATION_URL, TALKING_ANIMATION_URL,
};
pub use protocol::{
    classify_text, encode_command, parse_message, BridgeCommand, BridgeMessage,
    ProtocolParseError, SurfaceSignal,
};
pub use surface::{RenderSurfaceBridge, SurfaceStatus};
