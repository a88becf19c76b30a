//! Server configuration: compiled defaults overridden by environment.
//!
//! Precedence is defaults → environment. Each variable has strict parsing
//! rules; invalid values are silently ignored so a typo degrades to the
//! default instead of refusing to boot.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default maximum upload size: 150 MB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 150 * 1024 * 1024;

/// Configuration for the murmur server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8000`).
    pub port: u16,
    /// Directory holding server-side audio files addressable by filename.
    pub upload_dir: PathBuf,
    /// Root directory for model checkpoints, shared with the sidecars.
    pub models_dir: PathBuf,
    /// Base URL of the whisperx sidecar.
    pub whisperx_url: String,
    /// Base URL of the faster-whisper sidecar.
    pub faster_whisper_url: String,
    /// Hugging Face token; required for diarization.
    pub hf_token: Option<String>,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Maximum words per display segment.
    pub max_splits: usize,
    /// Model sizes to prefetch at startup.
    pub preload_models: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            upload_dir: PathBuf::from("/app/uploads"),
            models_dir: PathBuf::from("/app/models"),
            whisperx_url: "http://127.0.0.1:9000".into(),
            faster_whisper_url: "http://127.0.0.1:9001".into(),
            hf_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_splits: 12,
            preload_models: vec!["tiny".into(), "base".into(), "small".into()],
        }
    }
}

/// Configuration errors reported before the server starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_splits` must be at least 1; `0` would disable splitting.
    #[error("max_splits must be >= 1, got {0}")]
    InvalidMaxSplits(usize),
}

impl ServerConfig {
    /// Load defaults and apply overrides from the process environment.
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let mut config = Self::default();
        config.apply_overrides(&vars);
        config
    }

    /// Check invariants the rest of the service relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_splits == 0 {
            return Err(ConfigError::InvalidMaxSplits(self.max_splits));
        }
        Ok(())
    }

    /// Apply overrides from a variable map (the environment, in practice).
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) {
        if let Some(v) = read_string(vars, "MURMUR_HOST") {
            self.host = v;
        }
        if let Some(v) = read_u16(vars, "MURMUR_PORT", 1, 65535) {
            self.port = v;
        }
        if let Some(v) = read_string(vars, "UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = read_string(vars, "WHISPER_MODELS_DIR") {
            self.models_dir = PathBuf::from(v);
        }
        if let Some(v) = read_string(vars, "WHISPERX_URL") {
            self.whisperx_url = v;
        }
        if let Some(v) = read_string(vars, "FASTER_WHISPER_URL") {
            self.faster_whisper_url = v;
        }
        if let Some(v) = read_string(vars, "WHISPER_HF_TOKEN") {
            self.hf_token = Some(v);
        }
        if let Some(v) = read_usize(vars, "MURMUR_MAX_UPLOAD_BYTES", 1, usize::MAX) {
            self.max_upload_bytes = v;
        }
        if let Some(v) = read_usize(vars, "MURMUR_MAX_SPLITS", 1, 1000) {
            self.max_splits = v;
        }
        if let Some(v) = read_string(vars, "WHISPER_MODELS") {
            self.preload_models = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }
}

fn read_string(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|v| !v.is_empty()).cloned()
}

fn read_u16(vars: &HashMap<String, String>, name: &str, min: u16, max: u16) -> Option<u16> {
    vars.get(name)
        .and_then(|v| v.parse::<u16>().ok())
        .filter(|v| (min..=max).contains(v))
}

fn read_usize(vars: &HashMap<String, String>, name: &str, min: usize, max: usize) -> Option<usize> {
    vars.get(name)
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| (min..=max).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn default_bind_address() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
    }

    #[test]
    fn default_limits() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_upload_bytes, 150 * 1024 * 1024);
        assert_eq!(cfg.max_splits, 12);
    }

    #[test]
    fn default_preload_models() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.preload_models, vec!["tiny", "base", "small"]);
    }

    #[test]
    fn overrides_applied() {
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(&vars(&[
            ("MURMUR_HOST", "127.0.0.1"),
            ("MURMUR_PORT", "9999"),
            ("UPLOAD_DIR", "/data/uploads"),
            ("WHISPER_MODELS_DIR", "/data/models"),
            ("WHISPER_HF_TOKEN", "hf_secret"),
            ("WHISPER_MODELS", "tiny, large-v3"),
        ]));
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.upload_dir, PathBuf::from("/data/uploads"));
        assert_eq!(cfg.models_dir, PathBuf::from("/data/models"));
        assert_eq!(cfg.hf_token.as_deref(), Some("hf_secret"));
        assert_eq!(cfg.preload_models, vec!["tiny", "large-v3"]);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(&vars(&[
            ("MURMUR_PORT", "not-a-port"),
            ("MURMUR_MAX_SPLITS", "0"),
            ("MURMUR_HOST", ""),
        ]));
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.max_splits, 12);
        assert_eq!(cfg.host, "0.0.0.0");
    }

    #[test]
    fn empty_model_list_entries_dropped() {
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(&vars(&[("WHISPER_MODELS", "tiny,, base ,")]));
        assert_eq!(cfg.preload_models, vec!["tiny", "base"]);
    }

    #[test]
    fn validate_rejects_zero_max_splits() {
        let cfg = ServerConfig {
            max_splits: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidMaxSplits(0))
        ));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_splits, cfg.max_splits);
    }
}
