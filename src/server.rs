//! redlite TCP server
//!
//! Replays the write log, starts the expiry sweeper and then serves each
//! connection on its own tokio task: one request line in, at most one
//! response line out.

use crate::{
    db::Db,
    error::Result,
    protocol::Response,
    sweeper::{ExpirySweeper, DEFAULT_SWEEP_INTERVAL},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
};
use tracing::{debug, info, warn};

/// redlite server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub wal_path: PathBuf,
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:6379".to_string(),
            wal_path: PathBuf::from("database.aof"),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// redlite TCP server
pub struct KvServer {
    db: Arc<Db>,
    listener: TcpListener,
    sweep_interval: Duration,
}

impl KvServer {
    /// Open and replay the write log, then bind the listener.
    ///
    /// Failing to open the log is an error here; nothing is served without it.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let db = Db::open(&config.wal_path).await?;
        let listener = TcpListener::bind(&config.bind_addr).await?;

        Ok(Self {
            db: Arc::new(db),
            listener,
            sweep_interval: config.sweep_interval,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn db(&self) -> &Arc<Db> {
        &self.db
    }

    /// Start the sweeper and accept connections until the process exits
    pub async fn run(self) -> Result<()> {
        ExpirySweeper::new(self.db.store().clone(), self.sweep_interval).spawn();
        info!("redlite server listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New client connected: {}", addr);
                    let db = Arc::clone(&self.db);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, db).await {
                            warn!("Error handling client {}: {}", addr, e);
                        }
                        debug!("Client disconnected: {}", addr);
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Serve one connection until EOF or an I/O error
pub async fn handle_connection<S>(stream: S, db: Arc<Db>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut buf_reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if buf_reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // Only valid UTF-8 is executed, so the write log never holds a
        // substituted form of what the client sent.
        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim_end_matches('\n').trim_end_matches('\r');
                db.execute(line).await
            }
            Err(_) => Some(Response::Error("request is not valid UTF-8".to_string())),
        };

        if let Some(response) = response {
            writer.write_all(&response.to_bytes()).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}
