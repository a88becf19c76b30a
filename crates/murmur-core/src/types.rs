//! Data model: raw oracle words, repaired words, segments, transcriptions.
//!
//! Field names follow the wire contract of the transcription endpoint:
//! a word serializes as `{"word", "start", "end", "score", "speaker"?}`.

use serde::{Deserialize, Serialize};

/// A word as emitted by the inference/alignment oracle.
///
/// Timestamps and score may be absent; alignment models fail on numerals,
/// hesitations and cross-talk. [`crate::timing::repair_timings`] turns a
/// sequence of these into fully timed [`Word`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWord {
    /// The recognized token, possibly carrying trailing punctuation.
    #[serde(rename = "word")]
    pub text: String,
    /// Start offset in seconds, if the aligner produced one.
    #[serde(default)]
    pub start: Option<f64>,
    /// End offset in seconds, if the aligner produced one.
    #[serde(default)]
    pub end: Option<f64>,
    /// Confidence in `[0, 1]`. faster-whisper calls this `probability`.
    #[serde(default, alias = "probability")]
    pub score: Option<f64>,
    /// Speaker label assigned by diarization, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl RawWord {
    /// Convenience constructor for a word with full timing.
    pub fn timed(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
            score: None,
            speaker: None,
        }
    }
}

/// A recognized word with repaired, fully populated timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The recognized token.
    #[serde(rename = "word")]
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds, `>= start`.
    pub end: f64,
    /// Confidence in `[0, 1]`, `0.0` when the oracle gave none.
    pub score: f64,
    /// Speaker label, when diarization ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// A display-bounded run of words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Opaque id, unique within one transcription.
    pub id: String,
    /// Word texts joined with single spaces, whitespace-normalized.
    pub text: String,
    /// First word's start.
    pub start: f64,
    /// Last word's end.
    pub end: f64,
    /// Aggregate confidence. Currently always `0.0`; word-level scores are
    /// carried through on the words themselves.
    pub score: f64,
    /// The words composing this segment, in order. Never empty.
    pub words: Vec<Word>,
}

/// The full transcription returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Segment texts joined with single spaces.
    pub text: String,
    /// ISO language code, detected or requested.
    pub language: String,
    /// End of the last segment, or `0.0` when there are no segments.
    pub duration: f64,
    /// Ordered display segments.
    pub segments: Vec<Segment>,
}

impl Transcription {
    /// Assemble a transcription from finished segments.
    pub fn from_segments(language: impl Into<String>, segments: Vec<Segment>) -> Self {
        let joined = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = normalize_whitespace(&joined);
        let duration = segments.last().map_or(0.0, |s| s.end);
        Self {
            text,
            language: language.into(),
            duration,
            segments,
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> Word {
        Word {
            text: text.into(),
            start,
            end,
            score: 0.9,
            speaker: None,
        }
    }

    fn segment(id: &str, text: &str, start: f64, end: f64) -> Segment {
        Segment {
            id: id.into(),
            text: text.into(),
            start,
            end,
            score: 0.0,
            words: vec![word(text, start, end)],
        }
    }

    #[test]
    fn word_serializes_with_wire_names() {
        let w = word("hello", 0.0, 0.5);
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["word"], "hello");
        assert_eq!(json["start"], 0.0);
        assert_eq!(json["end"], 0.5);
        assert_eq!(json["score"], 0.9);
        assert!(json.get("speaker").is_none());
    }

    #[test]
    fn word_speaker_serialized_when_present() {
        let mut w = word("hello", 0.0, 0.5);
        w.speaker = Some("SPEAKER_00".into());
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["speaker"], "SPEAKER_00");
    }

    #[test]
    fn raw_word_accepts_probability_alias() {
        let json = r#"{"word": "hi", "start": 1.0, "end": 1.2, "probability": 0.87}"#;
        let raw: RawWord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.score, Some(0.87));
    }

    #[test]
    fn raw_word_tolerates_missing_timing() {
        let json = r#"{"word": "42"}"#;
        let raw: RawWord = serde_json::from_str(json).unwrap();
        assert_eq!(raw.text, "42");
        assert!(raw.start.is_none());
        assert!(raw.end.is_none());
        assert!(raw.score.is_none());
    }

    #[test]
    fn transcription_from_no_segments() {
        let t = Transcription::from_segments("en", vec![]);
        assert_eq!(t.text, "");
        assert_eq!(t.duration, 0.0);
        assert!(t.segments.is_empty());
    }

    #[test]
    fn transcription_joins_segment_texts() {
        let t = Transcription::from_segments(
            "en",
            vec![
                segment("a", "Hello there.", 0.0, 1.0),
                segment("b", "General Kenobi.", 1.5, 3.0),
            ],
        );
        assert_eq!(t.text, "Hello there. General Kenobi.");
        assert_eq!(t.duration, 3.0);
    }

    #[test]
    fn transcription_text_collapses_whitespace() {
        let t = Transcription::from_segments(
            "en",
            vec![segment("a", "  spaced   out  ", 0.0, 1.0)],
        );
        assert_eq!(t.text, "spaced out");
    }

    #[test]
    fn duration_comes_from_last_segment() {
        let t = Transcription::from_segments(
            "en",
            vec![
                segment("a", "one", 0.0, 2.0),
                segment("b", "two", 2.0, 7.25),
            ],
        );
        assert_eq!(t.duration, 7.25);
    }

    #[test]
    fn normalize_whitespace_handles_tabs_and_newlines() {
        assert_eq!(normalize_whitespace("a\tb\n c"), "a b c");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
