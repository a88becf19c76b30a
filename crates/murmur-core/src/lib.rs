//! # murmur-core
//!
//! Pure segment-construction core for the murmur transcription service.
//!
//! Takes the flat, chronological word stream produced by an external
//! speech-recognition oracle (timestamps may be missing or overlapping)
//! and turns it into display-ready subtitle segments:
//!
//! ```text
//! raw words → timing repair → corrected words
//!           → sentence grouping → recursive length-bounded split
//!           → segments → transcription
//! ```
//!
//! Everything in this crate is synchronous, allocation-local computation
//! with no I/O and no ambient configuration. Parameters such as the
//! maximum words per segment are always passed explicitly.

#![deny(unsafe_code)]

pub mod split;
pub mod timing;
pub mod types;

pub use split::SegmentSplitter;
pub use timing::repair_timings;
pub use types::{RawWord, Segment, Transcription, Word};
