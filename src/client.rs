//! Client library for connecting to a redlite server
//!
//! Every request gets exactly one response line, except a bare `GET` or a
//! blank line, which the server ignores. The typed helpers never send those.

use crate::error::{RedliteError, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Client for connecting to a redlite server
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Client {
    /// Connect to a redlite server
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send one raw request line and return the response line without its
    /// terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<String> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response = String::new();
        if self.reader.read_line(&mut response).await? == 0 {
            return Err(RedliteError::Server("connection closed by server".to_string()));
        }
        Ok(response.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Store a permanent value
    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        check_token("key", key)?;
        check_token("value", value)?;
        let response = self.send_line(&format!("SET {} {}", key, value)).await?;
        expect_ok(response)
    }

    /// Store a value that expires after `seconds`
    pub async fn setex(&mut self, key: &str, seconds: u64, value: &str) -> Result<()> {
        check_token("key", key)?;
        check_token("value", value)?;
        let response = self
            .send_line(&format!("SETEX {} {} {}", key, seconds, value))
            .await?;
        expect_ok(response)
    }

    /// Get a value by key. `(nil)` comes back as `None`.
    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        check_token("key", key)?;
        let response = self.send_line(&format!("GET {}", key)).await?;
        if response == "(nil)" {
            Ok(None)
        } else {
            Ok(Some(response))
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Keys and values travel as single whitespace-free tokens
fn check_token(what: &str, token: &str) -> Result<()> {
    if token.is_empty() || token.chars().any(|c| c.is_ascii_whitespace()) {
        return Err(RedliteError::InvalidArgument(format!(
            "{} must be a single non-empty token: {:?}",
            what, token
        )));
    }
    Ok(())
}

fn expect_ok(response: String) -> Result<()> {
    match response.as_str() {
        "OK" => Ok(()),
        "UNKNOWN" => Err(RedliteError::Server("server rejected command as UNKNOWN".to_string())),
        other => match other.strip_prefix("ERROR: ") {
            Some(message) => Err(RedliteError::Server(message.to_string())),
            None => Err(RedliteError::Protocol(format!(
                "Unexpected response: {}",
                other
            ))),
        },
    }
}
