//! Error types for the Bot API client.
//!
//! # Design
//! `Api` gets a dedicated variant because callers frequently distinguish
//! "the server understood and rejected the call" (bad chat id, flood limit)
//! from transport trouble. The full error envelope — `description`,
//! `error_code`, and `parameters.retry_after` — is surfaced on that variant
//! instead of being discarded with the response. Non-2xx responses whose
//! body is not an envelope (proxy pages, HTML error bodies) land in `Http`
//! with the raw status and body for debugging.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Api`](crate::Api) and [`Transport`](crate::Transport)
/// implementations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network, DNS, or TLS failure inside the HTTP transport.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with an `ok: false` envelope.
    #[error("api error: {description}")]
    Api {
        /// Numeric error code from the envelope, when present.
        error_code: Option<i64>,
        /// Human-readable description from the envelope.
        description: String,
        /// Seconds to wait before retrying, when the server is rate limiting.
        retry_after: Option<u64>,
    },

    /// The server returned a non-2xx status and the body was not an envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The envelope said `ok: true` but carried no `result` value.
    #[error("response envelope carried no result")]
    MissingResult,

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
