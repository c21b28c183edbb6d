//! redlite - a small in-memory key-value store with a line protocol
//!
//! This library provides:
//! - A shared record store with per-key time-to-live
//! - An append-only write log replayed at startup
//! - A background sweeper that evicts expired records
//! - A TCP server and client speaking one request per line

pub mod client;
pub mod db;
pub mod error;
pub mod protocol;
pub mod server;
pub mod store;
pub mod sweeper;
pub mod wal;

pub use client::Client;
pub use db::Db;
pub use error::{RedliteError, Result};
pub use protocol::{Command, Response};
pub use server::{KvServer, ServerConfig};
pub use store::{MemoryStore, Record, Store};
pub use sweeper::ExpirySweeper;
pub use wal::WriteAheadLog;
