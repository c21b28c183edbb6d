//! Append-only write log for redlite
//!
//! Every accepted mutating request is stored verbatim, one per line, and
//! replayed through the live command grammar at startup. The file only ever
//! grows.

use crate::error::{RedliteError, Result};
use crate::protocol::{parse_command, Command};
use crate::store::Store;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;
use tracing::debug;

/// Write log handle, opened once in append mode for the life of the process
#[derive(Debug)]
pub struct WriteAheadLog {
    file: File,
    path: PathBuf,
}

impl WriteAheadLog {
    /// Open (or create) the log. A server must not start if this fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                RedliteError::Wal(format!("cannot open {}: {}", path.display(), e))
            })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `raw_line` and sync it to disk.
    ///
    /// There is no lock of its own here: callers append only from inside
    /// [`MemoryStore::put_and_then`](crate::store::MemoryStore::put_and_then),
    /// so appends are serialized with, and ordered like, store mutations.
    ///
    /// On a multi-threaded runtime the write and sync run under
    /// `block_in_place`, so other tasks move off this worker during the fsync.
    pub fn append(&self, raw_line: &str) -> Result<()> {
        let mut entry = String::with_capacity(raw_line.len() + 1);
        entry.push_str(raw_line);
        entry.push('\n');

        let write = || -> io::Result<()> {
            let mut file = &self.file;
            file.write_all(entry.as_bytes())?;
            self.file.sync_data()
        };

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                task::block_in_place(write)?
            }
            _ => write()?,
        }
        Ok(())
    }

    /// Rebuild `store` from the log and return how many lines were applied.
    ///
    /// Every replayed write is permanent: the TTL of a `SETEX` line is
    /// dropped. Lines that do not parse as `SET`/`SETEX` are skipped. A
    /// missing file means there is no history yet.
    pub async fn replay_into<S: Store>(&self, store: &S) -> Result<usize> {
        let file = match tokio::fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut segments = BufReader::new(file).split(b'\n');
        let mut applied = 0;

        while let Some(segment) = segments.next_segment().await? {
            let Ok(line) = String::from_utf8(segment) else {
                debug!("skipping non-UTF-8 write log line");
                continue;
            };

            match parse_command(line.trim_end_matches('\r')) {
                Ok(Some(Command::Set { key, value }))
                | Ok(Some(Command::SetEx { key, value, .. })) => {
                    store.put(key, value, None).await;
                    applied += 1;
                }
                _ => debug!(line = %line, "skipping write log line"),
            }
        }

        Ok(applied)
    }
}
