//! Engine orchestration and per-configuration caching.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use murmur_core::{SegmentSplitter, Transcription, repair_timings};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::audio;
use crate::backend::{BackendKind, InferenceBackend, OracleOptions};
use crate::error::EngineError;
use crate::faster_whisper::FasterWhisperBackend;
use crate::whisperx::WhisperXBackend;

/// Shared configuration for building engines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory for model checkpoints, shared with the sidecars.
    pub models_root: PathBuf,
    /// Base URL of the whisperx sidecar.
    pub whisperx_url: String,
    /// Base URL of the faster-whisper sidecar.
    pub faster_whisper_url: String,
    /// Hugging Face token for gated downloads and diarization models.
    pub hf_token: Option<String>,
    /// Maximum words per display segment.
    pub max_splits: usize,
}

/// Identity of a ready-to-use engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineKey {
    /// Which runtime serves the request.
    pub backend: BackendKind,
    /// Whisper model size.
    pub model_size: String,
    /// Inference device, `cpu` or `cuda`.
    pub device: String,
}

/// One transcription pipeline: audio in, [`Transcription`] out.
///
/// Construction is cheap; the expensive part (model download) happens in
/// [`EngineRegistry::get`] before the engine is handed out.
pub struct TranscriptionEngine {
    backend: Arc<dyn InferenceBackend>,
    splitter: SegmentSplitter,
}

impl std::fmt::Debug for TranscriptionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionEngine").finish_non_exhaustive()
    }
}

impl TranscriptionEngine {
    /// Wrap a backend with the segment-construction pipeline.
    pub fn new(backend: Arc<dyn InferenceBackend>, max_splits: usize) -> Self {
        Self {
            backend,
            splitter: SegmentSplitter::new(max_splits),
        }
    }

    /// The backend serving this engine.
    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.backend
    }

    /// Transcribe raw audio bytes.
    ///
    /// Pipeline: decode on a blocking thread → 16kHz mono WAV → oracle →
    /// timing repair → segment splitter → transcription. An oracle reply
    /// with no words produces an empty transcription, not an error.
    pub async fn transcribe(
        &self,
        audio_bytes: Vec<u8>,
        mime_type: &str,
        options: &OracleOptions,
    ) -> Result<Transcription, EngineError> {
        let mime = mime_type.to_string();
        let (samples, _source_rate) =
            tokio::task::spawn_blocking(move || audio::decode_audio(&audio_bytes, &mime))
                .await
                .map_err(EngineError::join("audio decode task"))??;

        #[allow(clippy::cast_precision_loss)]
        let seconds = samples.len() as f64 / f64::from(audio::TARGET_SAMPLE_RATE);
        debug!(
            backend = self.backend.name(),
            "decoded {seconds:.1}s of audio ({} samples)",
            samples.len()
        );

        let wav = audio::encode_wav(&samples);
        let raw = self.backend.transcribe_raw(wav, options).await?;

        let words = repair_timings(raw.words);
        let segments = self.splitter.split_words(words);
        Ok(Transcription::from_segments(raw.language, segments))
    }
}

/// Cache of ready engines keyed by backend/model/device.
///
/// The first request for a configuration pays for the model download;
/// later requests reuse the cached engine. The lock is held across
/// `ensure_model` so concurrent first requests do not race the download.
pub struct EngineRegistry {
    config: EngineConfig,
    engines: Mutex<HashMap<EngineKey, Arc<TranscriptionEngine>>>,
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// The registry's shared configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch or build the engine for `key`.
    pub async fn get(&self, key: &EngineKey) -> Result<Arc<TranscriptionEngine>, EngineError> {
        let mut engines = self.engines.lock().await;
        if let Some(engine) = engines.get(key) {
            return Ok(Arc::clone(engine));
        }

        let backend = self.build_backend(key);
        backend.ensure_model().await?;
        info!(
            backend = %key.backend,
            model = %key.model_size,
            device = %key.device,
            "engine ready"
        );

        let engine = Arc::new(TranscriptionEngine::new(backend, self.config.max_splits));
        let _ = engines.insert(key.clone(), Arc::clone(&engine));
        Ok(engine)
    }

    fn build_backend(&self, key: &EngineKey) -> Arc<dyn InferenceBackend> {
        match key.backend {
            BackendKind::WhisperX => Arc::new(WhisperXBackend::new(
                self.config.whisperx_url.clone(),
                key.model_size.clone(),
                key.device.clone(),
                self.config.models_root.clone(),
                self.config.hf_token.clone(),
            )),
            BackendKind::FasterWhisper => Arc::new(FasterWhisperBackend::new(
                self.config.faster_whisper_url.clone(),
                key.model_size.clone(),
                key.device.clone(),
                self.config.models_root.clone(),
            )),
        }
    }
}
