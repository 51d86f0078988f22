use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::SlateError;

/// One file or directory record from a remote listing or stat call.
///
/// Always reflects a fresh remote query; nothing in this crate caches
/// entries across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified_time: Option<DateTime<Utc>>,
}

pub type RemoteReader = Box<dyn AsyncRead + Send + Unpin>;
pub type RemoteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Primitive operations over one authenticated remote connection.
///
/// The session owns exactly one implementation of this trait and consults
/// its state machine before every call, so implementations can assume they
/// are only used while connected. Kept as a trait so tests can substitute
/// an in-memory transport for the russh-backed one.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn stat(&self, path: &str) -> Result<RemoteEntry, SlateError>;

    /// List the entries of one directory level, in the order the server
    /// returns them. No recursion.
    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, SlateError>;

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SlateError>;

    /// Open for writing, creating the file and truncating any existing
    /// content. Destinations are overwritten unconditionally.
    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SlateError>;

    /// Release the underlying connection. Called exactly once per
    /// transport, from [`SlateSession::close`](crate::session::SlateSession::close).
    async fn close(&mut self) -> Result<(), SlateError>;
}

/// Factory for transports, consulted once per successful `connect()`.
///
/// The session goes through this seam instead of a concrete constructor so
/// tests can count handshakes and inject failures.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &crate::config::ConnectionConfig,
    ) -> Result<Box<dyn RemoteTransport>, SlateError>;
}

/// Join a remote directory and a child name with forward slashes.
///
/// Remote paths are always POSIX-style regardless of the local platform,
/// which is why this does not go through `std::path`.
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir == "." {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Final component of a remote path.
pub fn remote_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::{join_remote, remote_basename};

    #[test]
    fn join_handles_trailing_slash() {
        assert_eq!(join_remote("/incoming/", "a.csv"), "/incoming/a.csv");
        assert_eq!(join_remote("/incoming", "a.csv"), "/incoming/a.csv");
    }

    #[test]
    fn join_keeps_relative_names_bare() {
        assert_eq!(join_remote(".", "a.csv"), "a.csv");
        assert_eq!(join_remote("", "a.csv"), "a.csv");
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(remote_basename("/incoming/apps/a.csv"), "a.csv");
        assert_eq!(remote_basename("a.csv"), "a.csv");
    }
}
