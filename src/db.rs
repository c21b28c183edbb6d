//! Shared server state: the record store and the write log that backs it
//!
//! One `Db` is built at startup and handed (behind an `Arc`) to every
//! connection task; the sweeper gets a clone of its store.

use crate::error::{RedliteError, Result};
use crate::protocol::{parse_command, Command, Response};
use crate::store::{MemoryStore, Store};
use crate::wal::WriteAheadLog;
use std::path::Path;
use tracing::{error, info};

pub struct Db {
    store: MemoryStore,
    wal: WriteAheadLog,
}

impl Db {
    /// Open the write log and replay it into an empty store
    pub async fn open<P: AsRef<Path>>(wal_path: P) -> Result<Self> {
        let wal = WriteAheadLog::open(wal_path)?;
        let store = MemoryStore::new();

        info!("Restoring state from write log: {}", wal.path().display());
        let restored = wal.replay_into(&store).await?;
        info!("Restored {} keys from write log", restored);

        Ok(Self { store, wal })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn wal(&self) -> &WriteAheadLog {
        &self.wal
    }

    /// Run one request line. `None` means nothing is written back.
    ///
    /// `raw_line` is logged exactly as given for accepted writes, so it should
    /// already have its line terminator stripped.
    pub async fn execute(&self, raw_line: &str) -> Option<Response> {
        let command = match parse_command(raw_line) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(RedliteError::UnknownCommand(_)) => return Some(Response::Unknown),
            Err(e) => return Some(Response::Error(e.to_string())),
        };

        let response = match command {
            Command::Set { key, value } => self.write(key, value, None, raw_line).await,
            Command::SetEx {
                key,
                seconds,
                value,
            } => self.write(key, value, Some(seconds), raw_line).await,
            Command::Get { key } => match self.store.get(&key).await {
                Some(record) => Response::Value(record.value),
                None => Response::Nil,
            },
        };
        Some(response)
    }

    /// Apply a write and log it under the same exclusive access.
    ///
    /// A failed append leaves the in-memory write in place; the client still
    /// gets `OK`.
    async fn write(&self, key: String, value: String, ttl: Option<u64>, raw_line: &str) -> Response {
        let appended = self
            .store
            .put_and_then(key, value, ttl, || self.wal.append(raw_line))
            .await;

        if let Err(e) = appended {
            error!(line = raw_line, "write log append failed, write kept in memory only: {}", e);
        }
        Response::Ok
    }
}
