use serde::{Deserialize, Serialize};

use crate::identity::ContentIdentity;

/// A transcript segment (sentence/phrase) as the model emits it.
///
/// `text` keeps whatever leading/trailing whitespace whisper produced —
/// flattened output depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Complete transcription result for one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub language: String,
    pub duration: f64,
    pub model: String,
}

impl Transcript {
    /// Full text: segment texts concatenated in order with no separator
    /// inserted. Whisper emits each segment with its own leading space, so
    /// joining with anything here would double the whitespace.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Whole-second timed lines, the shape records and artifacts share.
    /// Start offsets are truncated, not rounded.
    pub fn to_lines(&self) -> Vec<TimedLine> {
        self.segments
            .iter()
            .map(|s| TimedLine {
                start_secs: s.start.max(0.0) as u64,
                text: s.text.clone(),
            })
            .collect()
    }
}

/// One transcript row: start offset in whole seconds plus the segment text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedLine {
    pub start_secs: u64,
    pub text: String,
}

/// Persisted transcript, keyed by content identity.
///
/// Lines are an explicit ordered sequence; chronological order never depends
/// on how the store serializes fields. Created once at first successful
/// transcription of an identity, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub identity: ContentIdentity,
    pub title: String,
    pub lines: Vec<TimedLine>,
}

impl TranscriptRecord {
    pub fn from_transcript(
        identity: ContentIdentity,
        title: String,
        transcript: &Transcript,
    ) -> Self {
        Self {
            identity,
            title,
            lines: transcript.to_lines(),
        }
    }

    /// Flattened text, same concatenation rule as [`Transcript::text`].
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}
