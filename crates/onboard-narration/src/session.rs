//! **PresentationSession** — synthesize → play → synchronize subtitles →
//! signal completion, for one narration at a time.
//!
//! Failures degrade instead of blocking: a session whose synthesis or load
//! fails still reaches the same terminal signal as a successful one, with an
//! empty display. The narration is enrichment, not a gate on user progress.

use crate::chunker;
use crate::playback::PlaybackBackend;
use crate::presenter;
use crate::synthesis::{NarrationRequest, SpeechSynthesis, VoicePersona};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle of one narration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Synthesizing,
    AwaitingDuration,
    Presenting,
    Completed,
    Failed,
}

/// Terminal result of a session. A `Failed` session already degraded
/// gracefully; callers proceed either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed,
}

/// Events emitted by a session: zero or more subtitle updates, then exactly
/// one `Ended` — unless the session is superseded first, in which case the
/// channel ends with a final `SubtitleCleared` and no terminal event.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A subtitle chunk became visible. At most one chunk is ever visible.
    SubtitleShown { text: String },
    /// The display went empty (inter-chunk gap, completion, or supersession).
    SubtitleCleared,
    /// Terminal event for the session.
    Ended {
        outcome: SessionOutcome,
        timestamp: DateTime<Utc>,
    },
}

/// Runs one presentation session at a time. Starting a new session
/// supersedes the previous one: its audio stops, its display clears, its
/// event channel closes.
pub struct Narrator {
    synthesis: Arc<dyn SpeechSynthesis>,
    playback: Arc<dyn PlaybackBackend>,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    task: JoinHandle<()>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: Arc<Mutex<SessionState>>,
}

impl Narrator {
    pub fn new(synthesis: Arc<dyn SpeechSynthesis>, playback: Arc<dyn PlaybackBackend>) -> Self {
        Self {
            synthesis,
            playback,
            active: None,
        }
    }

    /// Start a session for `text` spoken by `persona`, superseding any
    /// in-flight session. Returns the session's event stream.
    pub fn start(
        &mut self,
        text: impl Into<String>,
        persona: VoicePersona,
    ) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.supersede();

        let request = NarrationRequest::new(text, persona);
        let (events, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SessionState::Idle));
        let task = tokio::spawn(run_session(
            request,
            Arc::clone(&self.synthesis),
            Arc::clone(&self.playback),
            Arc::clone(&state),
            events.clone(),
        ));
        self.active = Some(ActiveSession {
            task,
            events,
            state,
        });
        rx
    }

    /// Tear down the active session without starting a new one (unmount
    /// path).
    pub fn stop(&mut self) {
        self.supersede();
    }

    /// Current session state; `Idle` when nothing is active.
    pub fn state(&self) -> SessionState {
        self.active
            .as_ref()
            .and_then(|a| a.state.lock().ok().map(|s| *s))
            .unwrap_or(SessionState::Idle)
    }

    fn supersede(&mut self) {
        if let Some(prev) = self.active.take() {
            prev.task.abort();
            self.playback.stop();
            let _ = prev.events.send(SessionEvent::SubtitleCleared);
            if let Ok(mut s) = prev.state.lock() {
                *s = SessionState::Idle;
            }
            info!("Session superseded: audio stopped, display cleared");
        }
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.supersede();
    }
}

async fn run_session(
    request: NarrationRequest,
    synthesis: Arc<dyn SpeechSynthesis>,
    playback: Arc<dyn PlaybackBackend>,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let set_state = |s: SessionState| {
        if let Ok(mut guard) = state.lock() {
            *guard = s;
        }
    };
    let finish = |outcome: SessionOutcome| {
        set_state(match outcome {
            SessionOutcome::Completed => SessionState::Completed,
            SessionOutcome::Failed => SessionState::Failed,
        });
        let _ = events.send(SessionEvent::Ended {
            outcome,
            timestamp: Utc::now(),
        });
    };

    set_state(SessionState::Synthesizing);
    info!(
        "Session: synthesizing {} chars with voice {}",
        request.text.len(),
        request.voice_id
    );
    let resource = match synthesis.synthesize(&request).await {
        Ok(r) => r,
        Err(e) => {
            warn!("Session: synthesis failed, completing without narration: {}", e);
            finish(SessionOutcome::Failed);
            return;
        }
    };

    // Chunking depends only on the text; do it before the decode settles.
    let chunks = chunker::chunk(&request.text);

    set_state(SessionState::AwaitingDuration);
    let handle = match playback.load(resource).await {
        Ok(h) => h,
        Err(e) => {
            warn!("Session: playback load failed, completing without narration: {}", e);
            finish(SessionOutcome::Failed);
            return;
        }
    };

    set_state(SessionState::Presenting);
    let schedule = presenter::build_schedule(&chunks, handle.duration());
    info!(
        "Session: presenting {} chunks over {:.2}s",
        schedule.len(),
        handle.duration().as_secs_f64()
    );

    // Playback completion is authoritative: an exhausted subtitle sequence
    // never completes the session on its own, and pacing is never cut short
    // while audio is still playing. The display may be mid-chunk when the
    // audio ends; it is cleared below.
    let pacing = presenter::run_schedule(schedule, &events);
    let finished = playback.wait_finished(&handle);
    tokio::pin!(pacing, finished);
    let mut pacing_done = false;
    loop {
        tokio::select! {
            _ = &mut finished => break,
            _ = &mut pacing, if !pacing_done => pacing_done = true,
        }
    }
    playback.release(&handle).await;

    let _ = events.send(SessionEvent::SubtitleCleared);
    finish(SessionOutcome::Completed);
}
