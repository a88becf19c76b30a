//! # murmur-engine
//!
//! Orchestration around the external speech-recognition oracle.
//!
//! # Architecture
//!
//! ```text
//! audio bytes → symphonia decode → rubato resample to 16kHz mono f32
//! → 16-bit PCM WAV → inference sidecar (whisperx or faster-whisper)
//! → raw timestamped words → timing repair → segment splitter
//! → Transcription
//! ```
//!
//! Inference, alignment and diarization run in runtime sidecars reached
//! over HTTP; this crate decodes audio, manages model files, picks and
//! caches engines per (backend, model, device), and post-processes the
//! oracle's word stream through `murmur-core`.

#![deny(unsafe_code)]

pub mod audio;
pub mod backend;
pub mod engine;
pub mod error;
pub mod faster_whisper;
pub mod model;
pub mod whisperx;

pub use backend::{BackendKind, InferenceBackend, OracleOptions, RawTranscript};
pub use engine::{EngineConfig, EngineKey, EngineRegistry, TranscriptionEngine};
pub use error::EngineError;
