//! # murmur-server
//!
//! Axum HTTP layer for the murmur transcription service.
//!
//! - `POST /transcription`: multipart upload or server-side filename,
//!   validated and dispatched to a cached engine
//! - `GET /healthcheck`: liveness probe
//! - Request validation happens before any engine work; errors serialize
//!   as `{"detail": "..."}` with a matching status code
//! - Graceful shutdown on ctrl-c

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod transcribe;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::MurmurServer;
