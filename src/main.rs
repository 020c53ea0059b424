use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use floodgate::config::{FloodgateConfig, LimitConfig};
use floodgate::limiter::{LimitState, RefreshHandle, SlidingWindowLimiter};
use floodgate::storage::{FileStorage, MemoryStorage, StorageBackend};

#[derive(Parser)]
#[command(name = "floodgate", version, about = "Client-local sliding-window rate limiting")]
struct Cli {
    /// Path to a YAML configuration file with named limits
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path of the JSON state file (overrides the config file's storage path)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current state of a named limit
    Status {
        /// Limit name (configured or one of the built-in presets)
        name: String,
    },
    /// Attempt to record one request against a named limit
    Record {
        /// Limit name (configured or one of the built-in presets)
        name: String,
    },
    /// Continuously refresh and print a named limit's state
    Watch {
        /// Limit name (configured or one of the built-in presets)
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => FloodgateConfig::from_file(path)?,
        None => FloodgateConfig::default(),
    };

    let storage = open_storage(&cli, &config);

    match cli.command {
        Command::Status { name } => {
            let limiter = build_limiter(&config, &name, storage)?;
            print_state(&name, &limiter.refresh());
        }
        Command::Record { name } => {
            let limiter = build_limiter(&config, &name, storage)?;
            if limiter.record_request() {
                println!("permitted");
            } else {
                println!("denied");
            }
            print_state(&name, &limiter.state());
        }
        Command::Watch { name } => {
            let limiter = Arc::new(build_limiter(&config, &name, storage)?);
            let handle = RefreshHandle::spawn_default(limiter);
            let mut rx = handle.subscribe();

            info!(limit = %name, "Watching rate limit state");
            loop {
                print_state(&name, &rx.borrow());
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = shutdown_signal() => {
                        info!("Shutting down");
                        break;
                    }
                }
            }
            handle.shutdown();
        }
    }

    Ok(())
}

/// Open the state store: CLI flag wins, then the config file, then memory.
fn open_storage(cli: &Cli, config: &FloodgateConfig) -> Arc<dyn StorageBackend> {
    let path = cli
        .store
        .clone()
        .or_else(|| config.storage.path.as_ref().map(PathBuf::from));
    match path {
        Some(path) => Arc::new(FileStorage::open(path)),
        None => Arc::new(MemoryStorage::new()),
    }
}

/// Resolve a limit by name from the config file, falling back to the
/// built-in presets.
fn build_limiter(
    config: &FloodgateConfig,
    name: &str,
    storage: Arc<dyn StorageBackend>,
) -> anyhow::Result<SlidingWindowLimiter> {
    let limit = match config.limit(name) {
        Some(resolved) => resolved?,
        None => match name {
            "feedback_submission" => LimitConfig::feedback_submission(),
            "changelog_creation" => LimitConfig::changelog_creation(),
            "api_general" => LimitConfig::api_general(),
            _ => anyhow::bail!("Unknown limit '{}'", name),
        },
    };
    Ok(SlidingWindowLimiter::new(limit, storage))
}

fn print_state(name: &str, state: &LimitState) {
    println!(
        "{}: can_proceed={} remaining={} reset_in={}ms reset_at={}",
        name, state.can_proceed, state.remaining_requests, state.time_until_reset, state.reset_time
    );
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
