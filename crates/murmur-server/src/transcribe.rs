//! `POST /transcription`, the transcription endpoint.
//!
//! Audio arrives either as a multipart `file` field or as a `filename`
//! query parameter resolving under the configured upload directory. All
//! validation happens here, before any model or sidecar work.

use std::path::Path;

use axum::Json;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use murmur_core::Transcription;
use murmur_engine::{BackendKind, EngineKey, OracleOptions};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::server::AppState;

/// Languages the service accepts as a hint, besides `auto`.
const SUPPORTED_LANGUAGES: &[&str] = &[
    "ar", "be", "bg", "bn", "ca", "cs", "cy", "da", "de", "el", "en", "es", "fr", "it", "ja",
    "nl", "pl", "pt", "ru", "sk", "sl", "sv", "tk", "tr", "zh",
];

/// Query parameters of the transcription endpoint.
#[derive(Debug, Deserialize)]
pub struct TranscribeParams {
    /// Server-side filename, used when no file is uploaded.
    pub filename: Option<String>,
    /// Whisper model size.
    #[serde(default = "default_model_size")]
    pub model_size: String,
    /// Language hint, or `auto` for detection.
    #[serde(default = "default_language")]
    pub language: String,
    /// Inference device.
    #[serde(default = "default_device")]
    pub device: String,
    /// Which runtime to use.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Whether to assign speaker labels.
    #[serde(default)]
    pub diarize: bool,
    /// Lower bound on speaker count.
    pub speaker_min: Option<u32>,
    /// Upper bound on speaker count.
    pub speaker_max: Option<u32>,
}

fn default_model_size() -> String {
    "small".into()
}

fn default_language() -> String {
    "auto".into()
}

fn default_device() -> String {
    "cpu".into()
}

fn default_backend() -> String {
    "whisperx".into()
}

/// POST /transcription
pub async fn transcription_handler(
    State(state): State<AppState>,
    Query(params): Query<TranscribeParams>,
    request: Request,
) -> Result<Json<Transcription>, ApiError> {
    let backend: BackendKind = params.backend.parse().map_err(ApiError::BadRequest)?;

    if params.device != "cpu" && params.device != "cuda" {
        return Err(ApiError::BadRequest(
            "Device must be either 'cpu' or 'cuda'".into(),
        ));
    }
    if !murmur_engine::model::is_supported(&params.model_size) {
        return Err(ApiError::BadRequest(format!(
            "model must be one of {:?}",
            murmur_engine::model::SUPPORTED_MODELS
        )));
    }
    if params.language != "auto" && !SUPPORTED_LANGUAGES.contains(&params.language.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "unsupported language: {}",
            params.language
        )));
    }
    if params.diarize {
        if backend != BackendKind::WhisperX {
            return Err(ApiError::BadRequest(
                "diarization requires the whisperx backend".into(),
            ));
        }
        if state.registry.config().hf_token.is_none() {
            return Err(ApiError::BadRequest(
                "diarization requires a configured Hugging Face token".into(),
            ));
        }
    }

    let (audio, mime) = read_audio(&state, &params, request).await?;
    info!(
        backend = %backend,
        model = %params.model_size,
        device = %params.device,
        bytes = audio.len(),
        "transcription request"
    );

    let key = EngineKey {
        backend,
        model_size: params.model_size.clone(),
        device: params.device.clone(),
    };
    let engine = state.registry.get(&key).await?;

    let options = OracleOptions {
        language: (params.language != "auto").then(|| params.language.clone()),
        diarize: params.diarize,
        speaker_min: params.speaker_min,
        speaker_max: params.speaker_max,
    };
    let transcription = engine.transcribe(audio, &mime, &options).await?;
    Ok(Json(transcription))
}

/// Pull audio bytes from the multipart body or the upload directory.
async fn read_audio(
    state: &AppState,
    params: &TranscribeParams,
    request: Request,
) -> Result<(Vec<u8>, String), ApiError> {
    let is_multipart = request
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?
        {
            if field.name() == Some("file") {
                let mime = field
                    .content_type()
                    .unwrap_or("audio/wav")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Upload(e.to_string()))?;
                if bytes.len() > state.config.max_upload_bytes {
                    return Err(ApiError::PayloadTooLarge(state.config.max_upload_bytes));
                }
                return Ok((bytes.to_vec(), mime));
            }
        }
        return Err(ApiError::BadRequest(
            "multipart body has no 'file' field".into(),
        ));
    }

    if let Some(filename) = &params.filename {
        let name = sanitize_filename(filename)?;
        let path = state.config.upload_dir.join(name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ApiError::FileNotFound(filename.clone())
            } else {
                ApiError::Io(e)
            }
        })?;
        return Ok((bytes, mime_for_path(&path)));
    }

    Err(ApiError::BadRequest(
        "No file uploaded and no filename provided".into(),
    ))
}

/// Reject filenames that could escape the upload directory.
fn sanitize_filename(name: &str) -> Result<&str, ApiError> {
    if name.is_empty()
        || name.contains(['/', '\\'])
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(ApiError::BadRequest(format!("invalid filename: {name}")));
    }
    Ok(name)
}

/// Guess a MIME type from the file extension; the decoder only uses it as
/// a probe hint, so a wrong guess is harmless.
fn mime_for_path(path: &Path) -> String {
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        _ => "audio/wav",
    };
    mime.to_string()
}
