//! whisperx runtime client.
//!
//! Talks to a whisperx sidecar that runs recognition, forced alignment
//! and (optionally) diarization, and replies with word-level alignments.
//! Alignment output is the messy kind: words may arrive without
//! timestamps, and speaker labels only appear when diarization ran.

use std::path::PathBuf;

use async_trait::async_trait;
use murmur_core::RawWord;
use serde::Deserialize;
use tracing::debug;

use crate::backend::{InferenceBackend, OracleOptions, RawTranscript, sidecar_form};
use crate::error::EngineError;
use crate::model;

/// HTTP client for a whisperx inference sidecar.
pub struct WhisperXBackend {
    http: reqwest::Client,
    base_url: String,
    model_size: String,
    device: String,
    models_root: PathBuf,
    hf_token: Option<String>,
}

/// Sidecar reply: detected language plus flat word alignments.
#[derive(Debug, Deserialize)]
struct WhisperXReply {
    language: String,
    #[serde(default)]
    word_segments: Vec<RawWord>,
}

impl WhisperXBackend {
    /// Create a client for the sidecar at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model_size: impl Into<String>,
        device: impl Into<String>,
        models_root: PathBuf,
        hf_token: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model_size: model_size.into(),
            device: device.into(),
            models_root,
            hf_token,
        }
    }
}

#[async_trait]
impl InferenceBackend for WhisperXBackend {
    fn name(&self) -> &'static str {
        "whisperx"
    }

    fn supports_diarization(&self) -> bool {
        true
    }

    async fn ensure_model(&self) -> Result<(), EngineError> {
        model::ensure_model(&self.models_root, &self.model_size, self.hf_token.as_deref()).await
    }

    async fn transcribe_raw(
        &self,
        wav: Vec<u8>,
        options: &OracleOptions,
    ) -> Result<RawTranscript, EngineError> {
        let mut form = sidecar_form(wav, &self.model_size, &self.device)?
            .text("diarize", options.diarize.to_string());
        if let Some(language) = &options.language {
            form = form.text("language", language.clone());
        }
        if let Some(min) = options.speaker_min {
            form = form.text("min_speakers", min.to_string());
        }
        if let Some(max) = options.speaker_max {
            form = form.text("max_speakers", max.to_string());
        }

        let response = self
            .http
            .post(format!("{}/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Oracle(format!(
                "whisperx sidecar returned {status}: {body}"
            )));
        }

        let reply: WhisperXReply = response.json().await?;
        debug!(
            language = %reply.language,
            words = reply.word_segments.len(),
            "whisperx alignment received"
        );
        Ok(RawTranscript {
            language: reply.language,
            words: reply.word_segments,
        })
    }
}
