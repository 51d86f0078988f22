use crate::error::SlateError;
use crate::transport::{RemoteEntry, RemoteTransport};

/// `list_all` output: entries partitioned by kind, each sequence in the
/// order the remote listing returned them. No entry appears in both.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub directories: Vec<RemoteEntry>,
    pub files: Vec<RemoteEntry>,
}

/// Walks one remote directory level and classifies entries.
///
/// Never recurses: callers wanting a tree issue further `list_all` calls
/// themselves, which keeps pathological directory depths their problem.
/// Never sorts: callers needing determinism beyond the server's order sort
/// explicitly.
pub struct DirectoryLister<'a> {
    transport: &'a dyn RemoteTransport,
}

impl<'a> DirectoryLister<'a> {
    pub fn new(transport: &'a dyn RemoteTransport) -> Self {
        DirectoryLister { transport }
    }

    pub async fn list_files(&self, dir: &str) -> Result<Vec<RemoteEntry>, SlateError> {
        let listing = self.list_all(dir).await?;
        Ok(listing.files)
    }

    pub async fn list_directories(&self, dir: &str) -> Result<Vec<RemoteEntry>, SlateError> {
        let listing = self.list_all(dir).await?;
        Ok(listing.directories)
    }

    pub async fn list_all(&self, dir: &str) -> Result<DirectoryListing, SlateError> {
        let entries = self.transport.read_dir(dir).await?;
        tracing::debug!(dir, count = entries.len(), "listed remote directory");

        let mut listing = DirectoryListing::default();
        for entry in entries {
            if entry.is_directory {
                listing.directories.push(entry);
            } else {
                listing.files.push(entry);
            }
        }
        Ok(listing)
    }
}
