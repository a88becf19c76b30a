//! The inference oracle seam.
//!
//! Everything acoustic (recognition, forced alignment, diarization) is
//! someone else's problem, reached through [`InferenceBackend`]. The core
//! pipeline is backend-agnostic: it consumes raw timestamped words and
//! never branches on which runtime produced them.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use murmur_core::RawWord;

use crate::error::EngineError;

/// Per-request knobs forwarded to the oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleOptions {
    /// Language hint; `None` lets the runtime detect it.
    pub language: Option<String>,
    /// Whether to assign speaker labels.
    pub diarize: bool,
    /// Lower bound on speaker count, diarization only.
    pub speaker_min: Option<u32>,
    /// Upper bound on speaker count, diarization only.
    pub speaker_max: Option<u32>,
}

/// The oracle's reply: a detected language and a flat, chronological word
/// stream. Timestamps may be missing or overlapping; repairing them is
/// the caller's job.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTranscript {
    /// Detected (or confirmed) ISO language code.
    pub language: String,
    /// Raw words across all of the runtime's internal segments, in order.
    pub words: Vec<RawWord>,
}

/// A speech-recognition runtime able to produce raw timestamped words.
///
/// One implementation per runtime sidecar; the engine holds these as trait
/// objects and treats them identically.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short runtime identifier, e.g. `"whisperx"`.
    fn name(&self) -> &'static str;

    /// Whether this runtime can assign speaker labels.
    fn supports_diarization(&self) -> bool {
        false
    }

    /// Make sure the configured model is present before transcribing.
    async fn ensure_model(&self) -> Result<(), EngineError>;

    /// Transcribe 16kHz mono WAV bytes into a raw word stream.
    async fn transcribe_raw(
        &self,
        wav: Vec<u8>,
        options: &OracleOptions,
    ) -> Result<RawTranscript, EngineError>;
}

/// The runtimes this service knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// whisperx: word-level alignment, optional diarization.
    WhisperX,
    /// faster-whisper: per-segment word timestamps, no diarization.
    FasterWhisper,
}

impl BackendKind {
    /// The identifier used in requests and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhisperX => "whisperx",
            Self::FasterWhisper => "faster-whisper",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whisperx" => Ok(Self::WhisperX),
            "faster-whisper" | "fasterwhisper" => Ok(Self::FasterWhisper),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Build the multipart form both sidecars accept: the WAV payload plus
/// model/device fields.
pub(crate) fn sidecar_form(
    wav: Vec<u8>,
    model_size: &str,
    device: &str,
) -> Result<reqwest::multipart::Form, EngineError> {
    let part = reqwest::multipart::Part::bytes(wav)
        .file_name("audio.wav")
        .mime_str("audio/wav")
        .map_err(|e| EngineError::Oracle(format!("multipart: {e}")))?;
    Ok(reqwest::multipart::Form::new()
        .part("file", part)
        .text("model_size", model_size.to_string())
        .text("device", device.to_string()))
}
