//! # onboard-narration — Speech-Synchronized Presentation Engine
//!
//! Fetches synthesized speech for a block of narration text, plays it back,
//! and drives a subtitle display whose chunk-by-chunk timing tracks the
//! *actual* clip duration — degrading gracefully when the audio request
//! fails or arrives late.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Narrator                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │  Synthesis   │→ │   Playback   │→ │  Presenter   │       │
//! │  │  (reqwest)   │  │   (rodio)    │  │ (timed show) │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! │         ↓                  ↓                 ↓              │
//! │    temp audio         duration ms      SessionEvent         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! One session runs at a time per [`Narrator`]; starting a new one supersedes
//! the previous session, stopping its audio and clearing its display.

pub mod chunker;
pub mod error;
pub mod playback;
pub mod presenter;
pub mod session;
pub mod synthesis;

pub use chunker::{chunk, chunk_with_limit, SubtitleChunk, MAX_LINE_CHARS};
pub use error::{NarrationError, NarrationResult};
pub use playback::{PlaybackBackend, PlaybackHandle, RodioPlayback};
pub use presenter::{
    build_schedule, ScheduledChunk, SubtitleSchedule, INTER_CHUNK_GAP,
};
pub use session::{Narrator, SessionEvent, SessionOutcome, SessionState};
pub use synthesis::{
    AudioResource, ElevenLabsTts, NarrationRequest, PlaceholderSynthesis, SpeechSynthesis,
    VoicePersona, VoiceSettings, DEFAULT_MODEL_ID,
};
