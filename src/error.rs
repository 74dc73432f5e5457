//! Error types for mousebot-client.
//!
//! Device-reported errors are not listed here: a decoded `bad_request`
//! payload is a successful call that carries an error, see
//! [`crate::schema::Reply::DeviceError`].

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum MousebotError {
    /// Request descriptor could not be serialized into a legal payload.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Write or read failure on the underlying transport.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The transport reached end-of-stream while a response was pending.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No terminator arrived before the deadline.
    #[error("Response timeout after {timeout:?}")]
    Timeout {
        /// The configured wait that elapsed.
        timeout: Duration,
    },

    /// A terminator arrived with no payload bytes before it.
    #[error("Empty response")]
    EmptyResponse,

    /// The frame did not parse as a response message.
    #[error("Decoding error: {source} (raw: {:02x?})", .raw.as_ref())]
    Decoding {
        /// Underlying protobuf error.
        #[source]
        source: prost::DecodeError,
        /// Frame bytes as received, terminator excluded.
        raw: Bytes,
    },

    /// Serial port could not be opened or configured.
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// A bounded topic queue had no room for a message.
    #[error("Topic queue full")]
    QueueFull,

    /// Invalid configuration value (poll rate, timeout).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MousebotError {
    /// True for a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MousebotError::Timeout { .. })
    }

    /// True when the link itself failed (write, read, or closed stream).
    pub fn is_transport(&self) -> bool {
        match self {
            MousebotError::Transport(_) | MousebotError::ConnectionClosed => true,
            #[cfg(feature = "serial")]
            MousebotError::Serial(_) => true,
            _ => false,
        }
    }

    /// Whether reissuing the same request can reasonably succeed.
    ///
    /// Timeouts are routine (no device attached, device busy). Encoding
    /// failures are caller bugs and protocol violations repeat themselves.
    pub fn is_retryable(&self) -> bool {
        self.is_timeout() || self.is_transport()
    }
}

/// Result type alias using MousebotError.
pub type Result<T> = std::result::Result<T, MousebotError>;
