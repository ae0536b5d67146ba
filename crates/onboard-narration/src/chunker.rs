//! **SubtitleChunker** — deterministic splitting of narration text into
//! display-sized lines. Pure function of the input text and threshold; no I/O.

/// Character threshold for one subtitle line.
pub const MAX_LINE_CHARS: usize = 50;

/// One display-sized segment of narration text. Word count drives the
/// presenter's time allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleChunk {
    pub text: String,
    pub word_count: usize,
}

/// Split `text` into subtitle chunks at the default threshold.
pub fn chunk(text: &str) -> Vec<SubtitleChunk> {
    chunk_with_limit(text, MAX_LINE_CHARS)
}

/// Greedily accumulate whitespace-delimited words into a running line; when
/// appending the next word would push the line past `limit` and the line is
/// non-empty, close the chunk and start a new one with that word. The
/// trailing partial line becomes the final chunk. Words are never split
/// mid-word: a single word longer than `limit` is kept whole.
pub fn chunk_with_limit(text: &str, limit: usize) -> Vec<SubtitleChunk> {
    let mut chunks = Vec::new();
    let mut line = String::new();
    let mut words_in_line = 0usize;

    for word in text.split_whitespace() {
        let appended_len = if line.is_empty() {
            word.len()
        } else {
            line.len() + 1 + word.len()
        };
        if appended_len > limit && !line.is_empty() {
            chunks.push(SubtitleChunk {
                text: std::mem::take(&mut line),
                word_count: words_in_line,
            });
            words_in_line = 0;
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
        words_in_line += 1;
    }
    if !line.is_empty() {
        chunks.push(SubtitleChunk {
            text: line,
            word_count: words_in_line,
        });
    }
    chunks
}
