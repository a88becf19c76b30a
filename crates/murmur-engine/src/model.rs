//! Whisper model catalog and file management.
//!
//! Model weights live in a shared directory mounted by both this service
//! and the inference sidecars; this module knows which sizes exist, where
//! their files go, and how to prefetch them from Hugging Face.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Whisper model sizes the service accepts.
pub const SUPPORTED_MODELS: &[&str] = &[
    "tiny",
    "tiny.en",
    "base",
    "base.en",
    "small",
    "small.en",
    "medium",
    "medium.en",
    "large-v2",
    "large-v3",
];

/// Files every converted faster-whisper checkpoint ships with.
const MODEL_FILES: &[&str] = &["model.bin", "config.json", "tokenizer.json", "vocabulary.txt"];

/// Whether `size` is in the supported catalog.
pub fn is_supported(size: &str) -> bool {
    SUPPORTED_MODELS.contains(&size)
}

/// Hugging Face repository holding the converted checkpoint for `size`.
pub fn hf_repo(size: &str) -> String {
    format!("Systran/faster-whisper-{size}")
}

/// Local directory for one model size under the shared models root.
pub fn model_dir(models_root: impl AsRef<Path>, size: &str) -> PathBuf {
    models_root.as_ref().join(format!("faster-whisper-{size}"))
}

/// Check if all files for `size` exist locally.
pub fn is_model_cached(models_root: impl AsRef<Path>, size: &str) -> bool {
    let dir = model_dir(models_root, size);
    MODEL_FILES.iter().all(|name| dir.join(name).exists())
}

/// Download the checkpoint for `size` if it is not already cached.
///
/// Validates the size first, then fetches via `hf-hub` on a blocking
/// thread (its API is sync HTTP). Files land under
/// `<models_root>/faster-whisper-<size>/`.
pub async fn ensure_model(
    models_root: impl AsRef<Path>,
    size: &str,
    hf_token: Option<&str>,
) -> Result<(), EngineError> {
    if !is_supported(size) {
        return Err(EngineError::UnsupportedModel(size.to_string()));
    }

    let dir = model_dir(&models_root, size);
    if is_model_cached(&models_root, size) {
        debug!("model {size} already cached at {}", dir.display());
        return Ok(());
    }

    info!("downloading faster-whisper-{size} from Hugging Face...");
    std::fs::create_dir_all(&dir).map_err(EngineError::Io)?;

    let size = size.to_string();
    let token = hf_token.map(String::from);
    tokio::task::spawn_blocking(move || download_model_files(&dir, &size, token))
        .await
        .map_err(|e| EngineError::ModelNotAvailable(format!("task join error: {e}")))?
}

fn download_model_files(
    dir: &Path,
    size: &str,
    token: Option<String>,
) -> Result<(), EngineError> {
    let api = hf_hub::api::sync::ApiBuilder::new()
        .with_token(token)
        .build()
        .map_err(|e| EngineError::ModelNotAvailable(format!("HF API init: {e}")))?;
    let repo = api.model(hf_repo(size));

    for &filename in MODEL_FILES {
        let target = dir.join(filename);
        if target.exists() {
            debug!("skipping {filename} (already exists)");
            continue;
        }

        info!("downloading {filename}...");
        match repo.get(filename) {
            Ok(cached_path) => {
                // hf-hub caches to its own dir; copy into the shared root
                if cached_path != target {
                    let _ = std::fs::copy(&cached_path, &target).map_err(|e| {
                        EngineError::ModelNotAvailable(format!("failed to copy {filename}: {e}"))
                    })?;
                }
                debug!("downloaded {filename}");
            }
            Err(e) => {
                warn!("failed to download {filename}: {e}");
                return Err(EngineError::ModelNotAvailable(format!(
                    "download failed for {filename}: {e}"
                )));
            }
        }
    }

    info!("model faster-whisper-{size} ready at {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_the_usual_sizes() {
        for size in ["tiny", "base", "small", "medium", "large-v3"] {
            assert!(is_supported(size), "missing size: {size}");
        }
        assert!(!is_supported("gigantic"));
        assert!(!is_supported(""));
    }

    #[test]
    fn english_only_variants_supported() {
        for size in ["tiny.en", "base.en", "small.en", "medium.en"] {
            assert!(is_supported(size), "missing size: {size}");
        }
    }

    #[test]
    fn hf_repo_naming() {
        assert_eq!(hf_repo("small"), "Systran/faster-whisper-small");
        assert_eq!(hf_repo("large-v3"), "Systran/faster-whisper-large-v3");
    }

    #[test]
    fn model_dir_under_root() {
        let dir = model_dir("/models", "base.en");
        assert_eq!(dir, PathBuf::from("/models/faster-whisper-base.en"));
    }

    #[test]
    fn empty_dir_is_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_model_cached(tmp.path(), "tiny"));
    }

    #[test]
    fn dir_with_all_files_is_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = model_dir(tmp.path(), "tiny");
        std::fs::create_dir_all(&dir).unwrap();
        for name in MODEL_FILES {
            std::fs::write(dir.join(name), b"stub").unwrap();
        }
        assert!(is_model_cached(tmp.path(), "tiny"));
    }

    #[test]
    fn partial_files_are_not_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = model_dir(tmp.path(), "tiny");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("model.bin"), b"stub").unwrap();
        assert!(!is_model_cached(tmp.path(), "tiny"));
    }

    #[tokio::test]
    async fn ensure_model_rejects_unknown_size() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ensure_model(tmp.path(), "gigantic", None).await;
        assert!(matches!(result, Err(EngineError::UnsupportedModel(_))));
    }

    #[tokio::test]
    async fn ensure_model_short_circuits_when_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = model_dir(tmp.path(), "tiny");
        std::fs::create_dir_all(&dir).unwrap();
        for name in MODEL_FILES {
            std::fs::write(dir.join(name), b"stub").unwrap();
        }
        // No network: must succeed purely from the cache check.
        ensure_model(tmp.path(), "tiny", None).await.unwrap();
    }
}
