//! Timing repair: fill missing word timestamps and remove overlaps.
//!
//! Alignment output is not trustworthy word-by-word. Some words arrive with
//! no timing at all, some overlap the word after them, and very short words
//! get sub-perceptible durations. This pass produces a sequence where every
//! word has a usable `start`/`end`, starts are non-decreasing, and no word
//! runs into the one that follows it.

use crate::types::{RawWord, Word};

/// Minimum perceptible display duration for a word, in seconds.
pub const MIN_WORD_DURATION: f64 = 0.5;

/// Guard between a word's end and the next word's start, in seconds.
pub const OVERLAP_GUARD: f64 = 0.001;

/// Offset applied when approximating timing for words the aligner skipped.
const MISSING_TIMING_STEP: f64 = 0.01;

/// A word after the first pass: start is settled, end may still be pending.
struct PartiallyTimed {
    text: String,
    start: f64,
    end: Option<f64>,
    score: f64,
    speaker: Option<String>,
}

/// Repair a chronological sequence of raw words into fully timed [`Word`]s.
///
/// Two passes:
///
/// 1. Words with no usable `start` are pinned just after the previous
///    word's end (`+ 0.01s`), or at `0` for the first word. That timing is
///    an acknowledged approximation; the real value is not recoverable.
/// 2. Every word's `end` is clamped to at least `start + 0.5s` and at most
///    the next word's `start - 1ms`. When the two conflict, the no-overlap
///    clamp wins, so a word squeezed by its successor may display for less
///    than the minimum duration. The last word has no successor and keeps
///    its end, subject only to the minimum-duration clamp.
///
/// An empty input yields an empty output. All offsets are rounded to
/// millisecond precision.
pub fn repair_timings(raw: Vec<RawWord>) -> Vec<Word> {
    let mut timed: Vec<PartiallyTimed> = Vec::with_capacity(raw.len());
    for word in raw {
        let (start, end) = match (word.start, word.end) {
            (Some(s), end) => (round_ms(s), end.map(round_ms)),
            (None, _) => {
                let anchor = timed.last().map_or(0.0, |prev| {
                    round_ms(prev.end.unwrap_or(prev.start) + MISSING_TIMING_STEP)
                });
                (anchor, Some(anchor))
            }
        };
        timed.push(PartiallyTimed {
            text: word.text,
            start,
            end,
            score: word.score.unwrap_or(0.0),
            speaker: word.speaker,
        });
    }

    let starts: Vec<f64> = timed.iter().map(|w| w.start).collect();

    timed
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let next_start = starts.get(i + 1).copied();
            let end = clamp_end(word.start, word.end, next_start);
            Word {
                text: word.text,
                start: word.start,
                end,
                score: word.score,
                speaker: word.speaker,
            }
        })
        .collect()
}

/// Resolve a word's end against the minimum duration and the next word.
fn clamp_end(start: f64, end: Option<f64>, next_start: Option<f64>) -> f64 {
    let floor = round_ms(start + MIN_WORD_DURATION);
    match next_start {
        Some(next) => {
            let ceiling = round_ms(next - OVERLAP_GUARD);
            // The no-overlap clamp is applied last and wins on conflict.
            end.unwrap_or(ceiling).max(floor).min(ceiling).max(start)
        }
        None => end.unwrap_or(floor).max(floor),
    }
}

/// Round to millisecond precision, matching the wire format.
fn round_ms(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, start: f64, end: f64) -> RawWord {
        RawWord::timed(text, start, end)
    }

    fn untimed(text: &str) -> RawWord {
        RawWord {
            text: text.into(),
            start: None,
            end: None,
            score: None,
            speaker: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(repair_timings(vec![]).is_empty());
    }

    #[test]
    fn fully_timed_sequence_is_untouched() {
        // Durations >= 0.5s and 1ms clearance to each successor: repair
        // must be a no-op, and running it twice must equal running it once.
        let input = vec![
            raw("one", 0.0, 0.6),
            raw("two", 0.601, 1.2),
            raw("three", 1.201, 1.8),
        ];
        let once = repair_timings(input.clone());
        assert_eq!(once.len(), 3);
        for (word, original) in once.iter().zip(&input) {
            assert_eq!(word.start, original.start.unwrap());
            assert_eq!(word.end, original.end.unwrap());
        }
        let again = repair_timings(
            once.iter()
                .map(|w| raw(&w.text, w.start, w.end))
                .collect(),
        );
        assert_eq!(again, once);
    }

    #[test]
    fn word_missing_both_timestamps_pinned_after_previous() {
        let words = repair_timings(vec![
            raw("before", 0.0, 1.0),
            untimed("1984"),
            raw("after", 3.0, 3.6),
        ]);
        // Pinned at previous end + 10ms; squeezed below minimum duration
        // only if the next word starts too soon (it does not here).
        assert_eq!(words[1].start, 1.01);
        assert_eq!(words[1].end, 1.51);
    }

    #[test]
    fn first_word_missing_timestamps_starts_at_zero() {
        let words = repair_timings(vec![untimed("hello"), raw("world", 2.0, 2.6)]);
        assert_eq!(words[0].start, 0.0);
        assert_eq!(words[0].end, 0.5);
    }

    #[test]
    fn word_missing_end_borrows_from_next_start() {
        let input = vec![
            RawWord {
                text: "stretch".into(),
                start: Some(1.0),
                end: None,
                score: None,
                speaker: None,
            },
            raw("next", 4.0, 4.6),
        ];
        let words = repair_timings(input);
        assert_eq!(words[0].end, 3.999);
    }

    #[test]
    fn last_word_missing_end_gets_minimum_duration() {
        let words = repair_timings(vec![
            raw("first", 0.0, 0.6),
            RawWord {
                text: "last".into(),
                start: Some(1.0),
                end: None,
                score: None,
                speaker: None,
            },
        ]);
        assert_eq!(words[1].end, 1.5);
    }

    #[test]
    fn minimum_duration_enforced_when_gap_permits() {
        let words = repair_timings(vec![raw("blip", 0.0, 0.1), raw("next", 2.0, 2.6)]);
        assert_eq!(words[0].end, 0.5);
    }

    #[test]
    fn no_overlap_clamp_wins_over_minimum_duration() {
        // Next word starts 0.2s in: 0.5s duration is impossible, the word
        // must end exactly 1ms before the successor. Accepted behavior.
        let words = repair_timings(vec![raw("fast", 0.0, 0.1), raw("next", 0.2, 0.8)]);
        assert_eq!(words[0].end, 0.199);
    }

    #[test]
    fn overlapping_words_are_separated() {
        let words = repair_timings(vec![raw("one", 0.0, 1.5), raw("two", 1.0, 1.6)]);
        assert_eq!(words[0].end, 0.999);
        assert_eq!(words[1].end, 1.6);
    }

    #[test]
    fn last_word_exempt_from_upper_clamp() {
        let words = repair_timings(vec![raw("a", 0.0, 0.6), raw("b", 1.0, 9.9)]);
        assert_eq!(words[1].end, 9.9);
    }

    #[test]
    fn monotonic_timing_property() {
        let words = repair_timings(vec![
            untimed("a"),
            raw("b", 0.3, 0.35),
            untimed("c"),
            raw("d", 2.0, 5.0),
            raw("e", 2.5, 2.6),
            untimed("f"),
        ]);
        for pair in words.windows(2) {
            assert!(
                pair[0].start <= pair[1].start,
                "starts must be non-decreasing: {pair:?}"
            );
            assert!(
                pair[0].end <= pair[1].start + OVERLAP_GUARD,
                "no overlap beyond tolerance: {pair:?}"
            );
        }
        for word in &words {
            assert!(word.end >= word.start, "non-negative duration: {word:?}");
        }
    }

    #[test]
    fn score_and_speaker_carried_through() {
        let input = vec![RawWord {
            text: "hi".into(),
            start: Some(0.0),
            end: Some(0.6),
            score: Some(0.93),
            speaker: Some("SPEAKER_01".into()),
        }];
        let words = repair_timings(input);
        assert_eq!(words[0].score, 0.93);
        assert_eq!(words[0].speaker.as_deref(), Some("SPEAKER_01"));
    }

    #[test]
    fn missing_score_defaults_to_zero() {
        let words = repair_timings(vec![raw("hi", 0.0, 0.6)]);
        assert_eq!(words[0].score, 0.0);
    }

    #[test]
    fn offsets_rounded_to_milliseconds() {
        let words = repair_timings(vec![raw("pi", 0.123_456, 3.141_592_6)]);
        assert_eq!(words[0].start, 0.123);
        assert_eq!(words[0].end, 3.142);
    }
}
