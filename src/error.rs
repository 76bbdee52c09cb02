//! Error types for the trading-stream crate.
//!
//! This module defines the errors that can occur while establishing and
//! operating the streaming connection. Steady-state connectivity problems are
//! retried internally and never surface here; these variants cover the
//! caller-facing operations (`connect`, command serialization) and transport
//! establishment.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// WebSocket transport error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server address could not be parsed
    #[error("invalid server address: {0}")]
    Address(#[from] url::ParseError),

    /// The transport connection is closed
    #[error("connection closed")]
    ConnectionClosed,

    /// `connect` was called while a session is already active
    ///
    /// One client drives exactly one logical session; call `disconnect`
    /// before starting a new one.
    #[error("a streaming session is already active")]
    SessionActive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Error::ConnectionClosed.to_string(), "connection closed");
        assert!(Error::SessionActive.to_string().contains("already active"));
    }

    #[test]
    fn test_json_error_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
