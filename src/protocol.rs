//! Line protocol for redlite
//!
//! One request per line, ASCII-whitespace separated tokens. Keys and values
//! are single tokens; there is no quoting.

use crate::error::{RedliteError, Result};
use nom::{
    bytes::complete::{take_till1, take_while},
    multi::many0,
    sequence::preceded,
    IResult,
};

/// Commands supported by the redlite protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    SetEx { key: String, seconds: u64, value: String },
    Get { key: String },
}

/// Response line written back for a processed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Value(String),
    Nil,
    Error(String),
    Unknown,
}

impl Response {
    /// Serialize response to bytes for network transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::Ok => b"OK\n".to_vec(),
            Response::Value(v) => format!("{}\n", v).into_bytes(),
            Response::Nil => b"(nil)\n".to_vec(),
            Response::Error(e) => format!("ERROR: {}\n", e).into_bytes(),
            Response::Unknown => b"UNKNOWN\n".to_vec(),
        }
    }
}

fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// A single token with any leading whitespace skipped
fn token(input: &str) -> IResult<&str, &str> {
    preceded(take_while(is_space), take_till1(is_space))(input)
}

/// Split a request line into its whitespace-delimited tokens
pub fn tokenize(line: &str) -> Result<Vec<&str>> {
    let (_, tokens) = many0(token)(line)?;
    Ok(tokens)
}

/// Parse a request line.
///
/// Returns `Ok(None)` for lines that get no response at all: blank lines and
/// a `GET` without a key. Too few arguments for `SET`/`SETEX` is
/// [`RedliteError::Usage`]; an unrecognised command word is
/// [`RedliteError::UnknownCommand`]. Tokens past the last expected argument
/// are ignored.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let tokens = tokenize(line)?;
    let Some((name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    match name.to_ascii_uppercase().as_str() {
        "SET" => match args {
            [key, value, ..] => Ok(Some(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
            })),
            _ => Err(RedliteError::Usage("SET key value")),
        },
        "SETEX" => match args {
            [key, seconds, value, ..] => Ok(Some(Command::SetEx {
                key: key.to_string(),
                seconds: parse_seconds(seconds),
                value: value.to_string(),
            })),
            _ => Err(RedliteError::Usage("SETEX key seconds value")),
        },
        "GET" => Ok(args.first().map(|key| Command::Get {
            key: key.to_string(),
        })),
        _ => Err(RedliteError::UnknownCommand(name.to_string())),
    }
}

/// TTL argument. Anything that is not an integer counts as 0, and so does a
/// negative number.
fn parse_seconds(raw: &str) -> u64 {
    raw.parse::<i64>().map(|s| s.max(0) as u64).unwrap_or(0)
}
