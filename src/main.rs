//! redlite server binary

use clap::Parser;
use redlite::{KvServer, ServerConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "In-memory key-value server with an append-only write log")]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    bind: String,

    /// Write log file, created if missing and replayed at startup
    #[arg(long, default_value = "database.aof")]
    wal_path: PathBuf,

    /// Expiry sweep interval in milliseconds
    #[arg(long, default_value = "1000")]
    sweep_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig {
        bind_addr: args.bind,
        wal_path: args.wal_path,
        sweep_interval: Duration::from_millis(args.sweep_interval_ms),
    };

    // A log that cannot be opened stops the process here.
    let server = KvServer::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        result = signal::ctrl_c() => {
            result?;
            info!("Received Ctrl+C, exiting");
        }
    }

    Ok(())
}
