pub mod config;
pub mod error;
pub mod lister;
pub mod pattern;
pub mod russh_transport;
pub mod session;
pub mod transfer;
pub mod transport;

pub use config::ConnectionConfig;
pub use error::SlateError;
pub use lister::DirectoryListing;
pub use session::{SessionState, SlateSession};
pub use transfer::{TransferResult, TransferStatus};
pub use transport::RemoteEntry;
