//! Interactive test harness for the client.
//!
//! Connects, prints the error stream and relays stdin lines to the server as
//! raw messages. A line whose command is `CTCP_<TAG>` is sent as a CTCP
//! query inside a PRIVMSG:
//!
//! ```text
//! CTCP_VERSION somenick
//! CTCP_ACTION #channel :waves
//! ```
//!
//! Usage:
//!   cargo run --example lmitest -- --address irc.libera.chat --port 6697 --tls --nick lmitest
//!
//! Set `RUST_LOG=slirc_client=trace` to see every line on the wire.

use std::net::IpAddr;

use anyhow::Result;
use clap::Parser;
use slirc_client::ctcp::CTCP_COMMAND_PREFIX;
use slirc_client::{Address, Client, ClientError, Ctcp, Message};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lmitest", about = "Interactive IRC client test harness")]
struct Args {
    /// Server host or IP address
    #[arg(long, default_value = "localhost")]
    address: String,

    /// Server port
    #[arg(long, default_value_t = 6667)]
    port: u16,

    /// Use TLS
    #[arg(long)]
    tls: bool,

    /// Nick (also used as the username)
    #[arg(long, default_value = "lmitest")]
    nick: String,
}

fn server_address(host: &str, port: u16) -> Address {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Address::V4 { ip, port },
        Ok(IpAddr::V6(ip)) => Address::V6 { ip, port },
        Err(_) => Address::host(host, port),
    }
}

/// Rewrite `CTCP_<TAG> target :text` into a CTCP PRIVMSG.
fn encode_ctcp(mut message: Message) -> Message {
    let Some(tag) = message.command.strip_prefix(CTCP_COMMAND_PREFIX) else {
        return message;
    };
    let body = Ctcp::custom(tag, message.trailing.as_deref()).to_string();
    message.command = "PRIVMSG".to_string();
    message.trailing = Some(body);
    message
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let client = Client::new(
        args.nick.as_str(),
        args.nick.as_str(),
        server_address(&args.address, args.port),
    );
    client.set_real_name("slirc-client test");
    client.set_use_tls(args.tls);

    let mut errors = client.subscribe_errors();
    tokio::spawn(async move {
        loop {
            match errors.recv().await {
                Ok(ClientError::Disconnected) => println!("* disconnected"),
                Ok(err) => println!("* error: {}", err),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    println!("* missed {} errors", n)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    client.add_handler("PRIVMSG", |_, msg| {
        if let (Some(from), Some(text)) = (msg.source_nickname(), msg.text()) {
            println!("<{}> {}", from, text);
        }
    });

    println!("Connecting to {} as {}...", args.address, args.nick);
    client.connect().await?;

    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupt received...");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Message>() {
                    Ok(message) => {
                        if let Err(e) = client.send(encode_ctcp(message)) {
                            println!("* not sent: {}", e);
                        }
                    }
                    Err(e) => println!("* {}", e),
                }
            }
        }
    }

    client.quit().await;
    runner.await?;
    Ok(())
}
