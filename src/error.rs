use std::path::PathBuf;

use russh_sftp::protocol::StatusCode;
use thiserror::Error;

/// Errors produced by session, listing and transfer operations.
///
/// Single-file operations return the specific variant to their caller.
/// Batch operations convert per-file errors into failed
/// [`TransferResult`](crate::transfer::TransferResult) entries instead and
/// only fail outright with [`SlateError::NoMatches`] or
/// [`SlateError::AllTransfersFailed`].
#[derive(Debug, Error)]
pub enum SlateError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("not connected; call connect() first")]
    NotConnected,

    #[error("remote path not found: {0}")]
    RemoteNotFound(String),

    #[error("local path not found: {0}")]
    LocalNotFound(PathBuf),

    #[error("permission denied on remote path: {0}")]
    PermissionDenied(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no files matching {pattern:?} in {dir}")]
    NoMatches { dir: String, pattern: String },

    #[error("all {0} attempted transfers failed")]
    AllTransfersFailed(usize),
}

impl From<russh::Error> for SlateError {
    fn from(err: russh::Error) -> Self {
        SlateError::Connection(err.to_string())
    }
}

/// Classify a russh-sftp error against the remote path it occurred on.
///
/// SFTP reports most failures through status packets; the two codes callers
/// branch on (missing path, denied access) get their own variants, the rest
/// collapse into `Connection`.
pub(crate) fn classify_sftp_error(path: &str, err: russh_sftp::client::error::Error) -> SlateError {
    match &err {
        russh_sftp::client::error::Error::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => SlateError::RemoteNotFound(path.to_string()),
            StatusCode::PermissionDenied => SlateError::PermissionDenied(path.to_string()),
            _ => SlateError::Connection(format!("sftp error on {}: {}", path, err)),
        },
        _ => SlateError::Connection(format!("sftp error on {}: {}", path, err)),
    }
}
