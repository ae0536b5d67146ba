//! Speak a welcome line with live subtitles printed to stdout.
//!
//! Requires `ELEVENLABS_API_KEY` in the environment (or a `.env` file), or
//! pass `--offline` to use the silent placeholder voice.
//!
//! Run: `cargo run --example narrate [-- --offline]`

use anyhow::Result;
use onboard_narration::{
    ElevenLabsTts, Narrator, PlaceholderSynthesis, RodioPlayback, SessionEvent, SpeechSynthesis,
    VoicePersona,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let offline = std::env::args().any(|a| a == "--offline");
    let synthesis: Arc<dyn SpeechSynthesis> = if offline {
        Arc::new(PlaceholderSynthesis::new(Duration::from_secs(3)))
    } else {
        Arc::new(ElevenLabsTts::from_env()?)
    };
    let playback = Arc::new(RodioPlayback::new()?);

    let mut narrator = Narrator::new(synthesis, playback);
    let mut events = narrator.start(
        "Hello and welcome. I will be your guide while we build your avatar together, \
         and once you are happy with it we can move on to your first training session.",
        VoicePersona::Narrator,
    );

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::SubtitleShown { text } => println!("  » {text}"),
            SessionEvent::SubtitleCleared => println!(),
            SessionEvent::Ended { outcome, .. } => {
                println!("narration ended: {outcome:?}");
                break;
            }
        }
    }
    Ok(())
}
