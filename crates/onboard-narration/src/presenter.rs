//! **SynchronizedSubtitlePresenter** — chunk visibility in lock-step with
//! elapsed playback time.
//!
//! The clip duration is allocated across chunks proportionally to word count.
//! This produces visually distinct, time-proportional subtitle segments
//! without word-level timestamps from the provider: per-word precision is
//! traded for robustness against providers that expose only a whole-clip
//! duration.

use crate::chunker::SubtitleChunk;
use crate::session::SessionEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Cleared-display gap between consecutive chunks.
pub const INTER_CHUNK_GAP: Duration = Duration::from_millis(100);

/// One chunk with its slot on the narration clock.
#[derive(Debug, Clone)]
pub struct ScheduledChunk {
    pub chunk: SubtitleChunk,
    pub start_offset: Duration,
    pub end_offset: Duration,
}

impl ScheduledChunk {
    /// How long the chunk stays visible.
    pub fn display_duration(&self) -> Duration {
        self.end_offset - self.start_offset
    }
}

/// Timing for a whole narration, derived once the total audio duration is
/// known. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SubtitleSchedule {
    entries: Vec<ScheduledChunk>,
}

impl SubtitleSchedule {
    pub fn entries(&self) -> &[ScheduledChunk] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allocate `total` across `chunks` proportionally to word count, with a
/// fixed cleared gap between consecutive chunks (none after the final one).
/// The per-chunk display durations sum to `total`; the gaps extend the
/// timeline beyond it.
pub fn build_schedule(chunks: &[SubtitleChunk], total: Duration) -> SubtitleSchedule {
    let total_words: usize = chunks.iter().map(|c| c.word_count).sum();
    if total_words == 0 {
        return SubtitleSchedule {
            entries: Vec::new(),
        };
    }
    let ms_per_word = total.as_secs_f64() * 1000.0 / total_words as f64;

    let mut entries = Vec::with_capacity(chunks.len());
    let mut cursor_ms = 0.0f64;
    for (i, chunk) in chunks.iter().enumerate() {
        let display_ms = chunk.word_count as f64 * ms_per_word;
        let start_ms = cursor_ms;
        let end_ms = cursor_ms + display_ms;
        entries.push(ScheduledChunk {
            chunk: chunk.clone(),
            start_offset: Duration::from_secs_f64(start_ms / 1000.0),
            end_offset: Duration::from_secs_f64(end_ms / 1000.0),
        });
        cursor_ms = end_ms;
        if i + 1 < chunks.len() {
            cursor_ms += INTER_CHUNK_GAP.as_secs_f64() * 1000.0;
        }
    }
    SubtitleSchedule { entries }
}

/// Drive the display through the schedule: show each chunk for its slot,
/// clearing for the fixed gap between chunks. Finite and consumed once. The
/// final chunk is left visible for the session to clear when playback ends.
/// A failed send means the session is gone; pacing stops immediately without
/// leaving a chunk stuck.
pub(crate) async fn run_schedule(
    schedule: SubtitleSchedule,
    events: &mpsc::UnboundedSender<SessionEvent>,
) {
    let count = schedule.entries.len();
    for (i, entry) in schedule.entries.into_iter().enumerate() {
        let shown = events.send(SessionEvent::SubtitleShown {
            text: entry.chunk.text,
        });
        if shown.is_err() {
            return;
        }
        sleep(entry.end_offset - entry.start_offset).await;
        if i + 1 < count {
            if events.send(SessionEvent::SubtitleCleared).is_err() {
                return;
            }
            sleep(INTER_CHUNK_GAP).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(words: usize) -> SubtitleChunk {
        SubtitleChunk {
            text: vec!["w"; words].join(" "),
            word_count: words,
        }
    }

    #[test]
    fn durations_are_word_proportional() {
        // 3000ms over word counts [2, 3] -> 1200ms and 1800ms, gap between.
        let chunks = [chunk_of(2), chunk_of(3)];
        let schedule = build_schedule(&chunks, Duration::from_millis(3000));
        let entries = schedule.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_duration(), Duration::from_millis(1200));
        assert_eq!(entries[1].display_duration(), Duration::from_millis(1800));
        assert_eq!(entries[0].start_offset, Duration::ZERO);
        // Second chunk starts after the first slot plus the cleared gap.
        assert_eq!(entries[1].start_offset, Duration::from_millis(1300));
        assert_eq!(entries[1].end_offset, Duration::from_millis(3100));
    }

    #[test]
    fn display_durations_sum_to_total() {
        let chunks = [chunk_of(7), chunk_of(1), chunk_of(4), chunk_of(9)];
        let total = Duration::from_millis(12_345);
        let schedule = build_schedule(&chunks, total);
        let sum: f64 = schedule
            .entries()
            .iter()
            .map(|e| e.display_duration().as_secs_f64())
            .sum();
        assert!((sum - total.as_secs_f64()).abs() < 1e-6);
    }

    #[test]
    fn single_chunk_gets_the_whole_duration() {
        let chunks = [chunk_of(5)];
        let schedule = build_schedule(&chunks, Duration::from_millis(2000));
        assert_eq!(schedule.len(), 1);
        assert_eq!(
            schedule.entries()[0].display_duration(),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn no_words_means_empty_schedule() {
        let schedule = build_schedule(&[], Duration::from_millis(1000));
        assert!(schedule.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_emits_show_clear_alternation() {
        let chunks = [chunk_of(2), chunk_of(2)];
        let schedule = build_schedule(&chunks, Duration::from_millis(1000));
        let (tx, mut rx) = mpsc::unbounded_channel();

        run_schedule(schedule, &tx).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        // Final chunk is left visible: Shown, Cleared, Shown.
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SessionEvent::SubtitleShown { .. }));
        assert!(matches!(events[1], SessionEvent::SubtitleCleared));
        assert!(matches!(events[2], SessionEvent::SubtitleShown { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_schedule_stops_quietly() {
        let chunks = [chunk_of(2), chunk_of(2), chunk_of(2)];
        let schedule = build_schedule(&chunks, Duration::from_millis(3000));
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        // Receiver gone: pacing must return without panicking.
        run_schedule(schedule, &tx).await;
    }
}
