//! Interactive relay: each typed line goes to the server and the reply is
//! printed back.

use clap::Parser;
use redlite::Client;
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Send typed lines to a redlite server")]
struct Args {
    /// Server address
    #[arg(default_value = "127.0.0.1:6379")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut client = Client::connect(&args.addr).await?;

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!(">> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim_end_matches('\n').trim_end_matches('\r');
        // The server stays silent on these; waiting for a reply would hang.
        if silent_request(line) {
            continue;
        }

        let reply = client.send_line(line).await?;
        println!("Server: {}", reply);
    }

    client.close().await?;
    Ok(())
}

fn silent_request(line: &str) -> bool {
    let mut tokens = line.split_ascii_whitespace();
    match tokens.next() {
        None => true,
        Some(word) => word.eq_ignore_ascii_case("GET") && tokens.next().is_none(),
    }
}
