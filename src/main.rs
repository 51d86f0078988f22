use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use futures::FutureExt;
use tracing_subscriber::EnvFilter;

use slate_sftp::transport::join_remote;
use slate_sftp::{ConnectionConfig, RemoteEntry, SlateError, SlateSession, TransferResult};

#[derive(Parser)]
#[command(name = "slate-sftp")]
#[command(about = "Manage files in a Slate-style SFTP drop directory")]
struct Cli {
    /// Path to the TOML connection config (falls back to $SLATE_SFTP_CONFIG,
    /// then ./slate-sftp.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files in a remote directory
    List {
        /// Remote directory (default: the configured default_remote_dir)
        #[arg(long)]
        dir: Option<String>,
    },
    /// Download files whose names contain a pattern
    Download {
        /// Literal substring to match; omit to download every file
        #[arg(long, default_value = "")]
        pattern: String,

        #[arg(long)]
        dir: Option<String>,

        /// Directory to save downloaded files into
        #[arg(long = "local-dir", default_value = "downloads")]
        local_dir: PathBuf,
    },
    /// Upload a single file into a remote directory
    Upload {
        /// Path of the local file to upload
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), SlateError> {
    let config = ConnectionConfig::load(&config_path(&cli))?;
    let session = SlateSession::new(config);

    match cli.command {
        Commands::List { dir } => {
            session
                .scoped(move |session| {
                    async move {
                        let dir = session.config().resolve_remote_dir(dir.as_deref());
                        let files = session.list_files(Some(&dir)).await?;
                        print_listing(&dir, &files);
                        Ok(())
                    }
                    .boxed()
                })
                .await
        }
        Commands::Download {
            pattern,
            dir,
            local_dir,
        } => {
            session
                .scoped(move |session| {
                    async move {
                        let results = session
                            .download_matching(dir.as_deref(), &pattern, &local_dir)
                            .await?;
                        print_summary("Download", &results);
                        println!("Files saved to: {}", local_dir.display());
                        Ok(())
                    }
                    .boxed()
                })
                .await
        }
        Commands::Upload { file, dir } => {
            // Fail fast on a missing source before opening a connection.
            if !file.is_file() {
                return Err(SlateError::LocalNotFound(file));
            }
            session
                .scoped(move |session| {
                    async move {
                        let name = file
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .ok_or_else(|| {
                                SlateError::Configuration(format!(
                                    "{} has no filename component",
                                    file.display()
                                ))
                            })?;
                        let remote_dir = session.config().resolve_remote_dir(dir.as_deref());
                        let remote_path = join_remote(&remote_dir, &name);
                        let bytes = session.upload_file(&file, &remote_path).await?;
                        println!(
                            "Uploaded {} to {} ({} bytes)",
                            file.display(),
                            remote_path,
                            bytes
                        );
                        Ok(())
                    }
                    .boxed()
                })
                .await
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| std::env::var_os("SLATE_SFTP_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("slate-sftp.toml"))
}

fn print_listing(dir: &str, files: &[RemoteEntry]) {
    if files.is_empty() {
        println!("No files found in {}.", dir);
        return;
    }
    println!("Listing files in {}:", dir);
    println!("{:<60} {:>12} {:<20}", "Filename", "Size (KB)", "Updated");
    println!("{}", "-".repeat(94));
    for entry in files {
        let size_kb = entry.size as f64 / 1024.0;
        let updated = entry
            .modified_time
            .map(|t| t.format("%m/%d/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<60} {:>12.2} {:<20}", entry.name, size_kb, updated);
    }
}

/// Per-file outcomes plus a succeeded/failed summary. Partial failure is
/// reported here but still exits zero; only outright operation failure
/// (propagated as an error) is non-zero.
fn print_summary(verb: &str, results: &[TransferResult]) {
    let mut succeeded = 0usize;
    for result in results {
        match &result.status {
            slate_sftp::TransferStatus::Success => {
                succeeded += 1;
                println!(
                    "{} -> {} ({} bytes)",
                    result.source_path, result.destination_path, result.bytes_transferred
                );
            }
            slate_sftp::TransferStatus::Failed(reason) => {
                println!("{} FAILED: {}", result.source_path, reason);
            }
        }
    }
    println!(
        "{} complete: {} of {} files transferred successfully",
        verb,
        succeeded,
        results.len()
    );
}
