//! faster-whisper runtime client.
//!
//! Talks to a faster-whisper sidecar that returns its native shape:
//! segments, each carrying word timestamps and probabilities. The words
//! are flattened across segments here; timing is complete but the
//! runtime knows nothing about speakers.

use std::path::PathBuf;

use async_trait::async_trait;
use murmur_core::RawWord;
use serde::Deserialize;
use tracing::debug;

use crate::backend::{InferenceBackend, OracleOptions, RawTranscript, sidecar_form};
use crate::error::EngineError;
use crate::model;

/// HTTP client for a faster-whisper inference sidecar.
pub struct FasterWhisperBackend {
    http: reqwest::Client,
    base_url: String,
    model_size: String,
    device: String,
    models_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FasterWhisperReply {
    language: String,
    #[serde(default)]
    segments: Vec<FasterWhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct FasterWhisperSegment {
    #[serde(default)]
    words: Vec<RawWord>,
}

impl FasterWhisperBackend {
    /// Create a client for the sidecar at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model_size: impl Into<String>,
        device: impl Into<String>,
        models_root: PathBuf,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model_size: model_size.into(),
            device: device.into(),
            models_root,
        }
    }
}

#[async_trait]
impl InferenceBackend for FasterWhisperBackend {
    fn name(&self) -> &'static str {
        "faster-whisper"
    }

    async fn ensure_model(&self) -> Result<(), EngineError> {
        model::ensure_model(&self.models_root, &self.model_size, None).await
    }

    async fn transcribe_raw(
        &self,
        wav: Vec<u8>,
        options: &OracleOptions,
    ) -> Result<RawTranscript, EngineError> {
        let mut form = sidecar_form(wav, &self.model_size, &self.device)?;
        if let Some(language) = &options.language {
            form = form.text("language", language.clone());
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
                "faster-whisper sidecar returned {status}: {body}"
            )));
        }

        let reply: FasterWhisperReply = response.json().await?;
        let words: Vec<RawWord> = reply
            .segments
            .into_iter()
            .flat_map(|segment| segment.words)
            .collect();
        debug!(
            language = %reply.language,
            words = words.len(),
            "faster-whisper transcript received"
        );
        Ok(RawTranscript {
            language: reply.language,
            words,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(base_url: &str) -> FasterWhisperBackend {
        FasterWhisperBackend::new(base_url, "base", "cpu", PathBuf::from("/tmp/models"))
    }

    #[tokio::test]
    async fn flattens_words_across_segments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "language": "en",
                "segments": [
                    {"words": [
                        {"word": "One", "start": 0.0, "end": 0.5, "probability": 0.99},
                        {"word": "two.", "start": 0.6, "end": 1.1, "probability": 0.97},
                    ]},
                    {"words": [
                        {"word": "Three.", "start": 2.0, "end": 2.5, "probability": 0.88},
                    ]},
                ],
            })))
            .mount(&server)
            .await;

        let raw = backend(&server.uri())
            .transcribe_raw(vec![0; 64], &OracleOptions::default())
            .await
            .unwrap();

        assert_eq!(raw.language, "en");
        assert_eq!(raw.words.len(), 3);
        assert_eq!(raw.words[2].text, "Three.");
        // `probability` maps onto the score field.
        assert_eq!(raw.words[0].score, Some(0.99));
        assert!(raw.words.iter().all(|w| w.speaker.is_none()));
    }

    #[tokio::test]
    async fn sidecar_failure_surfaces_as_oracle_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend(&server.uri())
            .transcribe_raw(vec![0; 64], &OracleOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Oracle(_)));
    }

    #[test]
    fn does_not_advertise_diarization() {
        assert!(!backend("http://localhost:9001").supports_diarization());
        assert_eq!(backend("http://localhost:9001").name(), "faster-whisper");
    }
}
