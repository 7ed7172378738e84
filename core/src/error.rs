//! Error types for the TickTick client and the OAuth flow.
//!
//! # Design
//! Every non-2xx response lands in `ApiError::Http` with the raw status code
//! and body. Argument mismatches detected before a request is built get their
//! own variant so callers can tell "nothing was sent" apart from "the server
//! refused".

use thiserror::Error;

/// Errors returned by `TickTickClient` build/parse methods and transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status, or a 2xx that signals failure.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The task id in the path differs from the id in the update payload.
    #[error("provided task id ({path_id}) and update request id ({body_id}) don't match")]
    TaskIdMismatch { path_id: String, body_id: String },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by the authorization-code flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The configured redirect URL has no usable host, port or scheme.
    #[error("invalid redirect url '{url}': {reason}")]
    InvalidRedirectUrl { url: String, reason: String },

    /// The local redirect listener could not be started.
    #[error("redirect listener failed: {0}")]
    Io(#[from] std::io::Error),

    /// The authorization server redirected back with an `error` parameter.
    #[error("authorization denied: {error}")]
    Denied {
        error: String,
        description: Option<String>,
    },

    /// A required query parameter was missing from the redirect.
    #[error("expected '{0}' query parameter not available")]
    MissingParameter(&'static str),

    /// The redirect carried a state token other than the one we issued.
    #[error("mismatch between expected and provided state ({actual})")]
    StateMismatch { expected: String, actual: String },

    /// The listener stopped before delivering an outcome.
    #[error("redirect listener closed without a callback")]
    ListenerClosed,

    /// The token exchange failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
