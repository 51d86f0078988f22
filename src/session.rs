use std::path::Path;

use futures::future::BoxFuture;

use crate::config::ConnectionConfig;
use crate::error::SlateError;
use crate::lister::{DirectoryLister, DirectoryListing};
use crate::russh_transport::RusshConnector;
use crate::transfer::{BatchTransferEngine, TransferResult};
use crate::transport::{Connector, RemoteEntry, RemoteTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// One SFTP session against one configured host.
///
/// Owns the single transport exclusively and guards every remote operation
/// behind the connection state: anything other than `connect`/`close`
/// fails fast with [`SlateError::NotConnected`] while disconnected, before
/// any remote call is made.
///
/// Sequential use from one task only; share nothing, or serialize access
/// yourself.
pub struct SlateSession {
    config: ConnectionConfig,
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn RemoteTransport>>,
}

impl SlateSession {
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, Box::new(RusshConnector))
    }

    /// Build a session over a custom transport factory. Tests use this to
    /// substitute an in-memory transport.
    pub fn with_connector(config: ConnectionConfig, connector: Box<dyn Connector>) -> Self {
        SlateSession {
            config,
            connector,
            transport: None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.transport.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Validate the config and establish the connection. Idempotent: a
    /// second call on a connected session performs no second handshake.
    pub async fn connect(&mut self) -> Result<(), SlateError> {
        if self.transport.is_some() {
            tracing::debug!(host = %self.config.hostname, "already connected, skipping handshake");
            return Ok(());
        }
        self.config.validate()?;
        let transport = self.connector.connect(&self.config).await?;
        self.transport = Some(transport);
        tracing::info!(
            host = %self.config.hostname,
            port = self.config.port,
            user = %self.config.username,
            "connected"
        );
        Ok(())
    }

    /// Release the connection. Idempotent, and safe to call from cleanup
    /// paths even when `connect()` never succeeded.
    pub async fn close(&mut self) -> Result<(), SlateError> {
        match self.transport.take() {
            Some(mut transport) => {
                tracing::info!(host = %self.config.hostname, "closing session");
                transport.close().await
            }
            None => Ok(()),
        }
    }

    /// Connect, run `operation`, and close on every exit path exactly
    /// once, whether the block succeeds or fails.
    pub async fn scoped<T, F>(mut self, operation: F) -> Result<T, SlateError>
    where
        F: for<'a> FnOnce(&'a mut SlateSession) -> BoxFuture<'a, Result<T, SlateError>>,
    {
        let result = match self.connect().await {
            Ok(()) => operation(&mut self).await,
            Err(err) => Err(err),
        };
        let close_result = self.close().await;
        let value = result?;
        close_result?;
        Ok(value)
    }

    fn transport(&self) -> Result<&dyn RemoteTransport, SlateError> {
        self.transport.as_deref().ok_or(SlateError::NotConnected)
    }

    /// Stat one remote path.
    pub async fn stat(&self, path: &str) -> Result<RemoteEntry, SlateError> {
        self.transport()?.stat(path).await
    }

    /// Files in `dir` (or the configured default directory), remote order.
    pub async fn list_files(&self, dir: Option<&str>) -> Result<Vec<RemoteEntry>, SlateError> {
        let transport = self.transport()?;
        let dir = self.config.resolve_remote_dir(dir);
        DirectoryLister::new(transport).list_files(&dir).await
    }

    /// Subdirectories of `dir` (or the configured default directory).
    pub async fn list_directories(
        &self,
        dir: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, SlateError> {
        let transport = self.transport()?;
        let dir = self.config.resolve_remote_dir(dir);
        DirectoryLister::new(transport).list_directories(&dir).await
    }

    /// Both partitions of one directory level.
    pub async fn list_all(&self, dir: Option<&str>) -> Result<DirectoryListing, SlateError> {
        let transport = self.transport()?;
        let dir = self.config.resolve_remote_dir(dir);
        DirectoryLister::new(transport).list_all(&dir).await
    }

    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<u64, SlateError> {
        let transport = self.transport()?;
        BatchTransferEngine::new(transport)
            .download_file(remote_path, local_path)
            .await
    }

    pub async fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<u64, SlateError> {
        let transport = self.transport()?;
        BatchTransferEngine::new(transport)
            .upload_file(local_path, remote_path)
            .await
    }

    /// Batch download of every file in `dir` whose name contains
    /// `pattern`. See [`BatchTransferEngine::download_matching`] for the
    /// partial-failure contract.
    pub async fn download_matching(
        &self,
        dir: Option<&str>,
        pattern: &str,
        local_dir: &Path,
    ) -> Result<Vec<TransferResult>, SlateError> {
        let transport = self.transport()?;
        let dir = self.config.resolve_remote_dir(dir);
        BatchTransferEngine::new(transport)
            .download_matching(&dir, pattern, local_dir)
            .await
    }

    /// Batch upload counterpart of [`SlateSession::download_matching`].
    pub async fn upload_matching(
        &self,
        local_dir: &Path,
        pattern: &str,
        dir: Option<&str>,
    ) -> Result<Vec<TransferResult>, SlateError> {
        let transport = self.transport()?;
        let dir = self.config.resolve_remote_dir(dir);
        BatchTransferEngine::new(transport)
            .upload_matching(local_dir, pattern, &dir)
            .await
    }
}
