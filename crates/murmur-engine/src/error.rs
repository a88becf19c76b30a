//! Engine error taxonomy.

/// Errors that can occur while orchestrating a transcription.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Requested model size is not in the supported catalog.
    #[error("unsupported model size: {0}")]
    UnsupportedModel(String),

    /// Model files not found or failed to download.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// Audio decoding failure (unsupported format, corrupt data).
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// Resampling failure.
    #[error("resample error: {0}")]
    Resample(String),

    /// The inference sidecar failed or returned an unusable reply.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// HTTP transport failure reaching the sidecar.
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (file read/write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Label a `JoinError` from a blocking task as an oracle-side failure.
    pub(crate) fn join(context: &str) -> impl FnOnce(tokio::task::JoinError) -> Self + '_ {
        move |e| Self::Oracle(format!("{context}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = EngineError::UnsupportedModel("gigantic".into());
        assert!(e.to_string().contains("gigantic"));

        let e = EngineError::AudioDecode("corrupt header".into());
        assert!(e.to_string().contains("corrupt header"));

        let e = EngineError::ModelNotAvailable("missing model.bin".into());
        assert!(e.to_string().contains("missing model.bin"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: EngineError = io.into();
        assert!(matches!(e, EngineError::Io(_)));
    }
}
