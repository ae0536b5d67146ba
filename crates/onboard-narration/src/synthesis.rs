//! **SpeechSynthesisClient** — text + voice selector in, playable audio resource out.
//!
//! One attempt per request, no internal retry: the narration is enrichment,
//! so callers treat any failure as terminal for that session and complete
//! silently instead of blocking the user.

use crate::error::{NarrationError, NarrationResult};
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::info;

/// Default provider model for narration clips.
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

/// Fixed voice set: the onboarding narrator plus the avatar greeting voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePersona {
    /// Narrator heard on the welcome and training screens.
    Narrator,
    /// Greeting voice for a male avatar.
    AvatarMale,
    /// Greeting voice for a female avatar.
    AvatarFemale,
}

impl VoicePersona {
    /// Provider voice id for this persona. Fixed strings; there is no runtime
    /// configuration surface beyond the persona selection.
    pub fn voice_id(self) -> &'static str {
        match self {
            VoicePersona::Narrator => "21m00Tcm4TlvDq8ikWAM",
            VoicePersona::AvatarMale => "TxGEqnHWrfWFTfGW9XjX",
            VoicePersona::AvatarFemale => "EXAVITQu4vr4xnSDxMaL",
        }
    }
}

/// Provider voice settings, serialized verbatim into the request body.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// One "speak this text" request. Immutable, constructed per session.
#[derive(Debug, Clone)]
pub struct NarrationRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
}

impl NarrationRequest {
    /// Build a request with the persona's fixed voice and provider defaults.
    pub fn new(text: impl Into<String>, persona: VoicePersona) -> Self {
        Self {
            text: text.into(),
            voice_id: persona.voice_id().to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

/// Opaque handle to synthesized audio on disk. Duration is unknown until the
/// playback controller decodes it. The temp file is removed when the resource
/// is dropped; holding the resource is holding the audio.
#[derive(Debug)]
pub struct AudioResource {
    file: NamedTempFile,
    byte_len: usize,
}

impl AudioResource {
    /// Write raw audio bytes to a scoped temp file.
    pub fn from_bytes(bytes: &[u8]) -> NarrationResult<Self> {
        let mut file = tempfile::Builder::new().prefix("narration-").tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            byte_len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// Backend that turns a narration request into a playable audio resource.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Synthesize the request. Single attempt; callers treat failure as
    /// terminal for the session.
    async fn synthesize(&self, request: &NarrationRequest) -> NarrationResult<AudioResource>;
}

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
const API_KEY_HEADER: &str = "xi-api-key";

/// Request body for the provider's text-to-speech endpoint.
#[derive(Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// Production synthesis backend: ElevenLabs text-to-speech over HTTPS.
#[derive(Debug, Clone)]
pub struct ElevenLabsTts {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    /// Build from the `ELEVENLABS_API_KEY` environment variable.
    pub fn from_env() -> NarrationResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| NarrationError::Config("ELEVENLABS_API_KEY is not set".to_string()))?;
        Self::new(api_key)
    }

    /// Create with an explicit API key (e.g. for tests or non-env wiring).
    pub fn new(api_key: impl Into<String>) -> NarrationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NarrationError::SynthesisTransport(e.to_string()))?;
        Ok(Self {
            base_url: ELEVENLABS_BASE_URL.to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Point at a different provider host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            voice_id
        )
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabsTts {
    async fn synthesize(&self, request: &NarrationRequest) -> NarrationResult<AudioResource> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(NarrationError::EmptyText);
        }
        let body = SynthesisBody {
            text,
            model_id: &request.model_id,
            voice_settings: &request.voice_settings,
        };
        let res = self
            .client
            .post(self.request_url(&request.voice_id))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrationError::SynthesisTransport(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(NarrationError::SynthesisStatus { status, body });
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| NarrationError::SynthesisTransport(e.to_string()))?;
        let resource = AudioResource::from_bytes(&bytes)?;
        info!(
            "Synthesis: {} bytes for voice {}",
            resource.byte_len(),
            request.voice_id
        );
        Ok(resource)
    }
}

/// Offline synthesis: a silent WAV of fixed duration. Use for keyless demos
/// and for exercising the session pipeline without the provider.
#[derive(Debug, Clone)]
pub struct PlaceholderSynthesis {
    duration: Duration,
}

impl PlaceholderSynthesis {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for PlaceholderSynthesis {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl SpeechSynthesis for PlaceholderSynthesis {
    async fn synthesize(&self, request: &NarrationRequest) -> NarrationResult<AudioResource> {
        if request.text.trim().is_empty() {
            return Err(NarrationError::EmptyText);
        }
        AudioResource::from_bytes(&silent_wav(self.duration))
    }
}

/// Minimal 16-bit mono PCM WAV filled with silence.
pub(crate) fn silent_wav(duration: Duration) -> Vec<u8> {
    const SAMPLE_RATE: u32 = 16_000;
    let sample_count = (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as u32;
    let data_len = sample_count * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes()); // byte rate
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personas_map_to_distinct_voices() {
        let ids = [
            VoicePersona::Narrator.voice_id(),
            VoicePersona::AvatarMale.voice_id(),
            VoicePersona::AvatarFemale.voice_id(),
        ];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn request_body_matches_provider_shape() {
        let request = NarrationRequest::new("Hello there", VoicePersona::Narrator);
        let body = SynthesisBody {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: &request.voice_settings,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["text"], "Hello there");
        assert_eq!(value["model_id"], "eleven_monolingual_v1");
        assert_eq!(value["voice_settings"]["stability"], 0.5);
        assert_eq!(value["voice_settings"]["similarity_boost"], 0.75);
        assert_eq!(value["voice_settings"]["use_speaker_boost"], true);
    }

    #[test]
    fn request_url_includes_voice_id() {
        let tts = ElevenLabsTts::new("test-key").unwrap();
        assert_eq!(
            tts.request_url("21m00Tcm4TlvDq8ikWAM"),
            "https://api.elevenlabs.io/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"
        );
        let tts = tts.with_base_url("http://localhost:8080/");
        assert_eq!(
            tts.request_url("abc"),
            "http://localhost:8080/v1/text-to-speech/abc"
        );
    }

    #[test]
    fn silent_wav_is_well_formed() {
        let wav = silent_wav(Duration::from_millis(500));
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 500ms at 16kHz mono 16-bit = 8000 samples = 16000 data bytes
        assert_eq!(wav.len(), 44 + 16_000);
    }

    #[tokio::test]
    async fn placeholder_rejects_empty_text() {
        let synth = PlaceholderSynthesis::default();
        let request = NarrationRequest::new("   ", VoicePersona::Narrator);
        assert!(matches!(
            synth.synthesize(&request).await,
            Err(NarrationError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn placeholder_writes_scoped_temp_file() {
        let synth = PlaceholderSynthesis::new(Duration::from_millis(100));
        let request = NarrationRequest::new("hello", VoicePersona::AvatarFemale);
        let resource = synth.synthesize(&request).await.unwrap();
        assert!(resource.path().exists());
        assert!(resource.byte_len() > 44);
        let path = resource.path().to_path_buf();
        drop(resource);
        assert!(!path.exists(), "release must remove the temp file");
    }
}
