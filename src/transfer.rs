use std::path::Path;

use tokio::fs;
use tokio::io::{self, AsyncWriteExt};

use crate::error::SlateError;
use crate::lister::DirectoryLister;
use crate::pattern;
use crate::transport::{join_remote, RemoteTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    Failed(String),
}

/// Outcome of one attempted file transfer within a batch.
///
/// A batch produces exactly one of these per selected file, in processing
/// order, even under partial failure.
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub source_path: String,
    pub destination_path: String,
    pub status: TransferStatus,
    pub bytes_transferred: u64,
}

impl TransferResult {
    pub fn succeeded(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

/// Sequential single-file and batch transfers over one transport.
///
/// Batch operations attempt every selected file and collect per-file
/// results instead of aborting on the first error; the only batch-level
/// failures are "nothing matched" and "every attempt failed".
pub struct BatchTransferEngine<'a> {
    transport: &'a dyn RemoteTransport,
}

impl<'a> BatchTransferEngine<'a> {
    pub fn new(transport: &'a dyn RemoteTransport) -> Self {
        BatchTransferEngine { transport }
    }

    /// Download one remote file, overwriting `local_path` unconditionally.
    /// Missing local parent directories are created.
    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<u64, SlateError> {
        let mut reader = self.transport.open_read(remote_path).await?;

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut local = fs::File::create(local_path).await?;

        let bytes = io::copy(&mut reader, &mut local).await?;
        local.flush().await?;
        tracing::info!(remote = remote_path, local = %local_path.display(), bytes, "downloaded file");
        Ok(bytes)
    }

    /// Upload one local file, overwriting `remote_path` unconditionally.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<u64, SlateError> {
        let mut local = match fs::File::open(local_path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SlateError::LocalNotFound(local_path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut writer = self.transport.open_write(remote_path).await?;
        let bytes = io::copy(&mut local, &mut writer).await?;
        // Shutdown closes the remote handle; without it the final write can
        // stay buffered in the sftp channel.
        writer.shutdown().await?;
        tracing::info!(local = %local_path.display(), remote = remote_path, bytes, "uploaded file");
        Ok(bytes)
    }

    /// Download every file in `remote_dir` whose name contains `pattern`
    /// into `local_dir`, keeping the remote basename.
    pub async fn download_matching(
        &self,
        remote_dir: &str,
        pattern: &str,
        local_dir: &Path,
    ) -> Result<Vec<TransferResult>, SlateError> {
        let files = DirectoryLister::new(self.transport)
            .list_files(remote_dir)
            .await?;
        let selected: Vec<_> = files
            .into_iter()
            .filter(|entry| pattern::matches(&entry.name, pattern))
            .collect();
        if selected.is_empty() {
            return Err(SlateError::NoMatches {
                dir: remote_dir.to_string(),
                pattern: pattern.to_string(),
            });
        }
        tracing::info!(
            dir = remote_dir,
            pattern,
            count = selected.len(),
            "downloading matching files"
        );

        let mut results = Vec::with_capacity(selected.len());
        for entry in &selected {
            let remote_path = join_remote(remote_dir, &entry.name);
            let local_path = local_dir.join(&entry.name);
            let result = match self.download_file(&remote_path, &local_path).await {
                Ok(bytes) => TransferResult {
                    source_path: remote_path,
                    destination_path: local_path.display().to_string(),
                    status: TransferStatus::Success,
                    bytes_transferred: bytes,
                },
                Err(err) => {
                    tracing::warn!(remote = %remote_path, "download failed: {}", err);
                    TransferResult {
                        source_path: remote_path,
                        destination_path: local_path.display().to_string(),
                        status: TransferStatus::Failed(err.to_string()),
                        bytes_transferred: 0,
                    }
                }
            };
            results.push(result);
        }

        finish_batch(results)
    }

    /// Upload every file in `local_dir` whose name contains `pattern` into
    /// `remote_dir`, keeping the local basename.
    pub async fn upload_matching(
        &self,
        local_dir: &Path,
        pattern: &str,
        remote_dir: &str,
    ) -> Result<Vec<TransferResult>, SlateError> {
        let selected = select_local_files(local_dir, pattern).await?;
        if selected.is_empty() {
            return Err(SlateError::NoMatches {
                dir: local_dir.display().to_string(),
                pattern: pattern.to_string(),
            });
        }
        tracing::info!(
            dir = %local_dir.display(),
            pattern,
            count = selected.len(),
            "uploading matching files"
        );

        let mut results = Vec::with_capacity(selected.len());
        for name in &selected {
            let local_path = local_dir.join(name);
            let remote_path = join_remote(remote_dir, name);
            let result = match self.upload_file(&local_path, &remote_path).await {
                Ok(bytes) => TransferResult {
                    source_path: local_path.display().to_string(),
                    destination_path: remote_path,
                    status: TransferStatus::Success,
                    bytes_transferred: bytes,
                },
                Err(err) => {
                    tracing::warn!(local = %local_path.display(), "upload failed: {}", err);
                    TransferResult {
                        source_path: local_path.display().to_string(),
                        destination_path: remote_path,
                        status: TransferStatus::Failed(err.to_string()),
                        bytes_transferred: 0,
                    }
                }
            };
            results.push(result);
        }

        finish_batch(results)
    }
}

/// Partial failure is still an overall success; only a fully failed batch
/// errors out, and distinguishably from "nothing matched".
fn finish_batch(results: Vec<TransferResult>) -> Result<Vec<TransferResult>, SlateError> {
    if results.iter().all(|r| !r.succeeded()) {
        return Err(SlateError::AllTransfersFailed(results.len()));
    }
    Ok(results)
}

/// Names of regular files in `local_dir` matching `pattern`, in directory
/// iteration order.
async fn select_local_files(local_dir: &Path, pattern: &str) -> Result<Vec<String>, SlateError> {
    let mut read_dir = match fs::read_dir(local_dir).await {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(SlateError::LocalNotFound(local_dir.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if pattern::matches(&name, pattern) {
            names.push(name);
        }
    }
    Ok(names)
}
