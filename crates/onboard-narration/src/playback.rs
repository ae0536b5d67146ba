//! **AudioPlaybackController** — at most one live audio resource at a time.
//!
//! Rodio's output objects are not `Send`, so the device lives on a dedicated
//! worker thread commanded over a channel. Loading a new clip stops and
//! releases the previous one before the replacement becomes current, which is
//! what keeps superseded narrations from overlapping audibly.

use crate::error::{NarrationError, NarrationResult};
use crate::synthesis::AudioResource;
use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Handle to a loaded clip. Duration is resolved by the decode, so it is
/// known as soon as the handle exists.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    id: u64,
    duration: Duration,
}

impl PlaybackHandle {
    pub fn new(id: u64, duration: Duration) -> Self {
        Self { id, duration }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Backend that loads and plays one audio resource at a time.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Decode and start the resource, releasing any previously loaded one
    /// first.
    async fn load(&self, resource: AudioResource) -> NarrationResult<PlaybackHandle>;

    /// Resolve once the clip behind `handle` has finished. Superseded or
    /// released handles resolve immediately.
    async fn wait_finished(&self, handle: &PlaybackHandle);

    /// Release the clip behind `handle` if it is still current.
    async fn release(&self, handle: &PlaybackHandle);

    /// Stop playback and release the current resource, whatever it is.
    fn stop(&self);
}

enum PlaybackCommand {
    Load {
        resource: AudioResource,
        reply: oneshot::Sender<NarrationResult<PlaybackHandle>>,
    },
    IsFinished {
        id: u64,
        reply: oneshot::Sender<bool>,
    },
    Release {
        id: u64,
    },
    Stop,
}

/// Rodio-backed playback on a dedicated worker thread.
pub struct RodioPlayback {
    cmd_tx: mpsc::UnboundedSender<PlaybackCommand>,
}

impl RodioPlayback {
    /// Open the default output device and start the worker thread.
    pub fn new() -> NarrationResult<Self> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (init_tx, init_rx) = std::sync::mpsc::channel();
        thread::Builder::new()
            .name("narration-playback".into())
            .spawn(move || playback_worker(cmd_rx, init_tx))?;
        match init_rx.recv() {
            Ok(Ok(())) => Ok(Self { cmd_tx }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(NarrationError::Playback(
                "playback worker exited during init".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PlaybackBackend for RodioPlayback {
    async fn load(&self, resource: AudioResource) -> NarrationResult<PlaybackHandle> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(PlaybackCommand::Load { resource, reply })
            .map_err(|_| NarrationError::Playback("playback worker unavailable".to_string()))?;
        rx.await
            .map_err(|_| NarrationError::Playback("playback worker dropped load reply".to_string()))?
    }

    async fn wait_finished(&self, handle: &PlaybackHandle) {
        loop {
            let (reply, rx) = oneshot::channel();
            let sent = self.cmd_tx.send(PlaybackCommand::IsFinished {
                id: handle.id,
                reply,
            });
            if sent.is_err() {
                return;
            }
            match rx.await {
                Ok(false) => tokio::time::sleep(POLL_INTERVAL).await,
                Ok(true) | Err(_) => return,
            }
        }
    }

    async fn release(&self, handle: &PlaybackHandle) {
        let _ = self.cmd_tx.send(PlaybackCommand::Release { id: handle.id });
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Stop);
    }
}

/// The single current-resource slot. Only the most recent load may hold it.
struct CurrentClip {
    id: u64,
    duration: Duration,
    sink: Sink,
    _resource: AudioResource,
}

fn playback_worker(
    mut cmd_rx: mpsc::UnboundedReceiver<PlaybackCommand>,
    init_tx: std::sync::mpsc::Sender<NarrationResult<()>>,
) {
    let (stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(NarrationError::Playback(e.to_string())));
            return;
        }
    };
    // Keep the device open for the worker's lifetime.
    let _stream = stream;
    let _ = init_tx.send(Ok(()));

    let mut current: Option<CurrentClip> = None;
    let mut next_id: u64 = 1;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            PlaybackCommand::Load { resource, reply } => {
                // Release before the replacement becomes current.
                if let Some(prev) = current.take() {
                    prev.sink.stop();
                    info!("Playback: clip {} released by new load", prev.id);
                }
                match stage_clip(&stream_handle, resource, next_id) {
                    Ok(clip) => {
                        let handle = PlaybackHandle::new(clip.id, clip.duration);
                        next_id += 1;
                        current = Some(clip);
                        let _ = reply.send(Ok(handle));
                    }
                    Err(e) => {
                        warn!("Playback: load failed: {}", e);
                        let _ = reply.send(Err(e));
                    }
                }
            }
            PlaybackCommand::IsFinished { id, reply } => {
                let finished = match current {
                    Some(ref clip) if clip.id == id => clip.sink.empty(),
                    // Superseded or already released handles are inert.
                    _ => true,
                };
                let _ = reply.send(finished);
            }
            PlaybackCommand::Release { id } => {
                if current.as_ref().map(|c| c.id) == Some(id) {
                    if let Some(clip) = current.take() {
                        clip.sink.stop();
                    }
                }
            }
            PlaybackCommand::Stop => {
                if let Some(clip) = current.take() {
                    clip.sink.stop();
                    info!("Playback: stopped");
                }
            }
        }
    }
}

/// Decode the whole clip, derive the exact duration from the sample count,
/// and start it on a fresh sink.
fn stage_clip(
    stream_handle: &OutputStreamHandle,
    resource: AudioResource,
    id: u64,
) -> NarrationResult<CurrentClip> {
    let file = File::open(resource.path())?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| NarrationError::Playback(format!("Decode failed: {}", e)))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<i16> = decoder.collect();
    if samples.is_empty() {
        return Err(NarrationError::Playback("Decoded clip is empty".to_string()));
    }
    let duration = Duration::from_secs_f64(
        samples.len() as f64 / (f64::from(sample_rate) * f64::from(channels)),
    );
    let sink = Sink::try_new(stream_handle)
        .map_err(|e| NarrationError::Playback(e.to_string()))?;
    sink.append(SamplesBuffer::new(channels, sample_rate, samples));
    info!(
        "Playback: clip {} staged ({:.2}s)",
        id,
        duration.as_secs_f64()
    );
    Ok(CurrentClip {
        id,
        duration,
        sink,
        _resource: resource,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::silent_wav;

    #[tokio::test]
    #[ignore] // Requires an audio output device
    async fn load_supersedes_previous_clip() {
        let playback = RodioPlayback::new().expect("audio device");
        let first = playback
            .load(AudioResource::from_bytes(&silent_wav(Duration::from_millis(400))).unwrap())
            .await
            .unwrap();
        let second = playback
            .load(AudioResource::from_bytes(&silent_wav(Duration::from_millis(100))).unwrap())
            .await
            .unwrap();

        // The first handle is stale: it must report finished immediately.
        playback.wait_finished(&first).await;
        assert_ne!(first.id(), second.id());
        playback.wait_finished(&second).await;
        playback.release(&second).await;
    }

    #[tokio::test]
    #[ignore] // Requires an audio output device
    async fn decoded_duration_matches_clip_length() {
        let playback = RodioPlayback::new().expect("audio device");
        let handle = playback
            .load(AudioResource::from_bytes(&silent_wav(Duration::from_millis(500))).unwrap())
            .await
            .unwrap();
        let ms = handle.duration().as_millis();
        assert!((450..=550).contains(&ms), "got {}ms", ms);
        playback.stop();
    }
}
