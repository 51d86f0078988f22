use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use russh::client;
use russh::Disconnect;
use russh_keys::key::{KeyPair, PublicKey};
use russh_keys::load_secret_key;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{FileAttributes, OpenFlags};

use crate::config::ConnectionConfig;
use crate::error::{classify_sftp_error, SlateError};
use crate::transport::{
    remote_basename, Connector, RemoteEntry, RemoteReader, RemoteTransport, RemoteWriter,
};

/// The russh-backed transport: one SSH connection carrying one SFTP
/// subsystem channel, authenticated with the configured private key.
pub struct RusshTransport {
    handle: client::Handle<TrustingHandler>,
    sftp: SftpSession,
}

impl RusshTransport {
    /// Dial, authenticate and open the SFTP subsystem.
    ///
    /// The whole establishment phase runs under the configured connect
    /// timeout when one is set; established-session operations are not
    /// subject to it.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, SlateError> {
        if !config.private_key_path.exists() {
            return Err(SlateError::Configuration(format!(
                "private key file not found at {}",
                config.private_key_path.display()
            )));
        }
        let key_pair = load_secret_key(&config.private_key_path, None).map_err(|e| {
            SlateError::Authentication(format!(
                "failed to load private key {}: {}",
                config.private_key_path.display(),
                e
            ))
        })?;

        match config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, Self::establish(config, key_pair))
                .await
                .map_err(|_| {
                    SlateError::Connection(format!(
                        "connection to {}:{} timed out",
                        config.hostname, config.port
                    ))
                })?,
            None => Self::establish(config, key_pair).await,
        }
    }

    async fn establish(config: &ConnectionConfig, key_pair: KeyPair) -> Result<Self, SlateError> {
        let ssh_config = Arc::new(client::Config::default());

        let mut handle = client::connect(
            ssh_config,
            (config.hostname.clone(), config.port),
            TrustingHandler {},
        )
        .await
        .map_err(|e| {
            SlateError::Connection(format!(
                "failed to connect to {}:{}: {}",
                config.hostname, config.port, e
            ))
        })?;

        let authenticated = handle
            .authenticate_publickey(config.username.as_str(), Arc::new(key_pair))
            .await
            .map_err(|e| {
                SlateError::Authentication(format!(
                    "public key authentication errored for {}: {}",
                    config.username, e
                ))
            })?;
        if !authenticated {
            return Err(SlateError::Authentication(format!(
                "server rejected public key for user {}",
                config.username
            )));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SlateError::Connection(format!("failed to open channel: {}", e)))?;
        channel.request_subsystem(true, "sftp").await.map_err(|e| {
            SlateError::Connection(format!("failed to request sftp subsystem: {}", e))
        })?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SlateError::Connection(format!("failed to open sftp session: {}", e)))?;

        tracing::debug!(
            host = %config.hostname,
            port = config.port,
            user = %config.username,
            "sftp session established"
        );

        Ok(RusshTransport { handle, sftp })
    }
}

#[async_trait]
impl RemoteTransport for RusshTransport {
    async fn stat(&self, path: &str) -> Result<RemoteEntry, SlateError> {
        let attrs = self
            .sftp
            .metadata(path.to_string())
            .await
            .map_err(|e| classify_sftp_error(path, e))?;
        Ok(entry_from_attrs(remote_basename(path).to_string(), &attrs))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, SlateError> {
        let read_dir = self
            .sftp
            .read_dir(path.to_string())
            .await
            .map_err(|e| classify_sftp_error(path, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let metadata = entry.metadata();
            entries.push(entry_from_attrs(entry.file_name(), &metadata));
        }
        Ok(entries)
    }

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SlateError> {
        let file = self
            .sftp
            .open_with_flags(path.to_string(), OpenFlags::READ)
            .await
            .map_err(|e| classify_sftp_error(path, e))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SlateError> {
        let file = self
            .sftp
            .open_with_flags(
                path.to_string(),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
            )
            .await
            .map_err(|e| classify_sftp_error(path, e))?;
        Ok(Box::new(file))
    }

    async fn close(&mut self) -> Result<(), SlateError> {
        // Cleanup path: a failed disconnect still counts as released, the
        // connection dies with the handle either way.
        if let Err(err) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::warn!("disconnect returned an error: {}", err);
        }
        Ok(())
    }
}

fn entry_from_attrs(name: String, attrs: &FileAttributes) -> RemoteEntry {
    RemoteEntry {
        name,
        is_directory: attrs.is_dir(),
        size: attrs.size.unwrap_or(0),
        modified_time: attrs
            .mtime
            .and_then(|mtime| Utc.timestamp_opt(mtime as i64, 0).single()),
    }
}

/// Default connector used by sessions built with
/// [`SlateSession::new`](crate::session::SlateSession::new).
pub struct RusshConnector;

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn RemoteTransport>, SlateError> {
        Ok(Box::new(RusshTransport::connect(config).await?))
    }
}

/// Accepts any server host key.
///
/// Host key management is out of scope for this crate; deployments that
/// need verification should front the drop host with their own known-hosts
/// tooling.
pub struct TrustingHandler {}

#[async_trait]
impl client::Handler for TrustingHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
