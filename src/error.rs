//! Errors returned by the Lemmy client.

use reqwest::StatusCode;

/// Everything that can go wrong while talking to a Lemmy instance.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The instance answered with a non-success status.  `message` is the
    /// `error` field of Lemmy's JSON error body when present, otherwise the
    /// raw body.
    #[error("Lemmy API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("need to provide username and password")]
    MissingCredentials,

    #[error("couldn't log in, have you verified your email?")]
    LoginRejected,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Status code of an [`Api`](ClientError::Api) or HTTP error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}
