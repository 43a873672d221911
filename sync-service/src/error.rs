use std::path::PathBuf;

/// Failure taxonomy for a sync run.
///
/// Nothing here is retried internally; every variant aborts the current
/// meter (or the whole run, for startup errors) and surfaces at the CLI
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The refresh token file is absent or unreadable. Startup error.
    #[error("refresh token unavailable at {path}: {message}")]
    CredentialMissing { path: PathBuf, message: String },

    /// The remote API rejected the token exchange.
    #[error("token exchange failed (status {status}): {body}")]
    AuthFailure { status: u16, body: String },

    /// Any non-2xx response from a data endpoint.
    #[error("remote API error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// Response shape did not match the documented envelope; indicates
    /// API contract drift and is logged with the offending fragment.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("date formatting error: {0}")]
    DateFormat(#[from] time::error::Format),
}

pub type Result<T> = std::result::Result<T, SyncError>;
