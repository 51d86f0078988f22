#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use slate_sftp::error::SlateError;
use slate_sftp::transport::{
    join_remote, Connector, RemoteEntry, RemoteReader, RemoteTransport, RemoteWriter,
};
use slate_sftp::ConnectionConfig;

/// In-memory stand-in for a remote SFTP host. Listing order is insertion
/// order, matching the "order as returned by the server" contract.
#[derive(Default)]
pub struct RemoteState {
    listings: HashMap<String, Vec<(String, bool)>>,
    files: HashMap<String, Vec<u8>>,
    denied_dirs: HashSet<String>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

impl RemoteState {
    pub fn add_dir(&mut self, dir: &str) {
        self.listings.entry(dir.to_string()).or_default();
    }

    pub fn add_file(&mut self, dir: &str, name: &str, content: &[u8]) {
        self.add_dir(dir);
        self.listings
            .get_mut(dir)
            .unwrap()
            .push((name.to_string(), false));
        self.files.insert(join_remote(dir, name), content.to_vec());
    }

    pub fn add_subdir(&mut self, dir: &str, name: &str) {
        self.add_dir(dir);
        self.listings
            .get_mut(dir)
            .unwrap()
            .push((name.to_string(), true));
        self.add_dir(&join_remote(dir, name));
    }

    pub fn deny_dir(&mut self, dir: &str) {
        self.denied_dirs.insert(dir.to_string());
    }

    pub fn fail_reads_of(&mut self, path: &str) {
        self.failing_reads.insert(path.to_string());
    }

    pub fn fail_writes_of(&mut self, path: &str) {
        self.failing_writes.insert(path.to_string());
    }

    pub fn file_content(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(path)
    }

    fn commit_file(&mut self, path: &str, content: Vec<u8>) {
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (".".to_string(), path.to_string()),
        };
        let listing = self.listings.entry(dir).or_default();
        if !listing.iter().any(|(n, _)| *n == name) {
            listing.push((name, false));
        }
        self.files.insert(path.to_string(), content);
    }
}

pub type SharedState = Arc<Mutex<RemoteState>>;

pub struct MockTransport {
    state: SharedState,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn stat(&self, path: &str) -> Result<RemoteEntry, SlateError> {
        let state = self.state.lock().unwrap();
        if let Some(content) = state.files.get(path) {
            return Ok(RemoteEntry {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                is_directory: false,
                size: content.len() as u64,
                modified_time: None,
            });
        }
        if state.listings.contains_key(path) {
            return Ok(RemoteEntry {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                is_directory: true,
                size: 0,
                modified_time: None,
            });
        }
        Err(SlateError::RemoteNotFound(path.to_string()))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, SlateError> {
        let state = self.state.lock().unwrap();
        if state.denied_dirs.contains(path) {
            return Err(SlateError::PermissionDenied(path.to_string()));
        }
        let Some(children) = state.listings.get(path) else {
            return Err(SlateError::RemoteNotFound(path.to_string()));
        };
        Ok(children
            .iter()
            .map(|(name, is_directory)| RemoteEntry {
                name: name.clone(),
                is_directory: *is_directory,
                size: state
                    .files
                    .get(&join_remote(path, name))
                    .map(|c| c.len() as u64)
                    .unwrap_or(0),
                modified_time: None,
            })
            .collect())
    }

    async fn open_read(&self, path: &str) -> Result<RemoteReader, SlateError> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(path) {
            return Err(SlateError::Connection(format!(
                "injected read failure for {}",
                path
            )));
        }
        match state.files.get(path) {
            Some(content) => Ok(Box::new(io::Cursor::new(content.clone()))),
            None => Err(SlateError::RemoteNotFound(path.to_string())),
        }
    }

    async fn open_write(&self, path: &str) -> Result<RemoteWriter, SlateError> {
        let state = self.state.lock().unwrap();
        if state.failing_writes.contains(path) {
            return Err(SlateError::Connection(format!(
                "injected write failure for {}",
                path
            )));
        }
        Ok(Box::new(MockWriter {
            path: path.to_string(),
            buf: Vec::new(),
            state: self.state.clone(),
        }))
    }

    async fn close(&mut self) -> Result<(), SlateError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Buffers writes and commits them to the shared state on shutdown, like a
/// remote file handle that materializes on close.
struct MockWriter {
    path: String,
    buf: Vec<u8>,
    state: SharedState,
}

impl AsyncWrite for MockWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buf.extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let content = std::mem::take(&mut self.buf);
        let path = self.path.clone();
        self.state.lock().unwrap().commit_file(&path, content);
        Poll::Ready(Ok(()))
    }
}

/// Counting connector over the shared in-memory state.
pub struct MockConnector {
    pub state: SharedState,
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub fail_connect: bool,
}

impl MockConnector {
    pub fn new(state: SharedState) -> Self {
        MockConnector {
            state,
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_connect: false,
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn RemoteTransport>, SlateError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(SlateError::Connection("injected connect failure".into()));
        }
        Ok(Box::new(MockTransport {
            state: self.state.clone(),
            closed: self.closes.clone(),
        }))
    }
}

pub fn mock_config() -> ConnectionConfig {
    let mut config = ConnectionConfig::new("mock.example.edu", "slate", "/keys/id_rsa");
    config.default_remote_dir = Some("/incoming/applications".to_string());
    config
}

/// A drop directory with two files and one subdirectory.
pub fn seeded_state() -> SharedState {
    let mut state = RemoteState::default();
    state.add_file("/incoming/applications", "a.txt", b"alpha");
    state.add_file("/incoming/applications", "b.csv", b"beta,rows");
    state.add_subdir("/incoming/applications", "sub");
    Arc::new(Mutex::new(state))
}
