//! Segment splitter: partition repaired words into display-bounded segments.
//!
//! Two stages. Stage A scans the word stream and accumulates a buffer,
//! flushing it only when a sentence-terminal word (`.`, `?`, `!`) arrives
//! *and* the buffer has outgrown the maximum; short sentences keep
//! accumulating, so a segment may legitimately span several of them.
//! Stage B recursively splits an oversized buffer at the friendliest
//! boundary it can find: the comma nearest the middle, else the largest
//! timing gap near the middle, else the midpoint.

use uuid::Uuid;

use crate::types::{Segment, Word, normalize_whitespace};

/// Default maximum word count per segment, doubling as the recursion budget.
pub const DEFAULT_MAX_SPLITS: usize = 12;

/// Recursion budget for the end-of-input flush. Trailing content never saw
/// a sentence boundary, so it is split more conservatively than mid-stream
/// buffers.
const TRAILING_SPLIT_DEPTH: usize = 3;

/// Splits word sequences into segments of at most `max_splits` words,
/// preferring natural break points.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSplitter {
    max_splits: usize,
}

impl SegmentSplitter {
    /// Create a splitter with the given per-segment word bound.
    ///
    /// A bound of `0` degrades to one segment per sentence buffer: the
    /// recursion base case short-circuits immediately. Callers that
    /// consider that a misconfiguration must validate before invoking.
    pub fn new(max_splits: usize) -> Self {
        Self { max_splits }
    }

    /// Create a splitter with the default word bound.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_SPLITS)
    }

    /// Partition a repaired word sequence into finished segments.
    pub fn split_words(&self, words: Vec<Word>) -> Vec<Segment> {
        let mut groups: Vec<Vec<Word>> = Vec::new();
        let mut buffer: Vec<Word> = Vec::new();

        for word in words {
            let terminal = ends_sentence(&word.text);
            buffer.push(word);
            if terminal && buffer.len() > self.max_splits {
                groups.extend(self.split(std::mem::take(&mut buffer), self.max_splits));
            }
        }
        if !buffer.is_empty() {
            groups.extend(self.split(buffer, TRAILING_SPLIT_DEPTH.min(self.max_splits)));
        }

        groups
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(materialize)
            .collect()
    }

    /// Recursively split `words` at natural boundaries until every group
    /// fits the word bound or the depth budget runs out.
    ///
    /// With the budget exhausted an oversized group is returned as-is,
    /// a degenerate but valid result rather than an error.
    pub fn split(&self, mut words: Vec<Word>, remaining_depth: usize) -> Vec<Vec<Word>> {
        if words.len() <= self.max_splits || remaining_depth == 0 {
            return vec![words];
        }

        let middle = words.len() / 2;
        let split_index = comma_split_index(&words, middle)
            .or_else(|| gap_split_index(&words, middle))
            .unwrap_or(middle);

        let right = words.split_off(split_index + 1);
        let mut groups = self.split(words, remaining_depth - 1);
        groups.extend(self.split(right, remaining_depth - 1));
        groups
    }
}

impl Default for SegmentSplitter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Whether a word closes a sentence.
fn ends_sentence(text: &str) -> bool {
    text.ends_with(['.', '?', '!'])
}

/// Index of the comma-bearing word closest to `middle`, excluding the last
/// word. Ties keep the lowest index.
fn comma_split_index(words: &[Word], middle: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let last = words.len().saturating_sub(1);
    for (i, word) in words[..last].iter().enumerate() {
        if word.text.contains(',') {
            let distance = middle.abs_diff(i);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, i));
            }
        }
    }
    best.map(|(_, index)| index)
}

/// Index before the largest positive timing gap within the window of
/// `len / 5` words around `middle`. Only a strictly larger gap replaces the
/// running maximum, so ties keep the earliest index and a window with no
/// positive gaps yields no split point.
fn gap_split_index(words: &[Word], middle: usize) -> Option<usize> {
    let window = words.len() / 5;
    let window_start = middle.saturating_sub(window);
    let window_end = (middle + window).min(words.len());

    let mut best = None;
    let mut max_gap = 0.0_f64;
    for i in window_start..window_end.saturating_sub(1) {
        let gap = words[i + 1].start - words[i].end;
        if gap > max_gap {
            max_gap = gap;
            best = Some(i);
        }
    }
    best
}

/// Build a finished segment from a non-empty word group.
fn materialize(words: Vec<Word>) -> Segment {
    let joined = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let start = words.first().map_or(0.0, |w| w.start);
    let end = words.last().map_or(0.0, |w| w.end);
    Segment {
        id: Uuid::new_v4().simple().to_string(),
        text: normalize_whitespace(&joined),
        start,
        end,
        // Word confidences exist but are not aggregated here; the segment
        // score is pinned to zero until the aggregation policy is decided.
        score: 0.0,
        words,
    }
}
