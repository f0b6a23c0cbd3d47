//! # slirc-client
//!
//! A reconnecting IRC client connection engine.
//!
//! A [`Client`] owns a single persistent connection to an IRC server. It
//! frames and parses inbound lines, dispatches them to registered handlers,
//! queues outbound commands, keeps the link alive with PINGs and redials with
//! linear backoff when the connection drops.
//!
//! ## Features
//!
//! - Read, write and ping loops on tokio, coordinated by a cancellation token
//! - Bounded outbound queue with non-blocking sends
//! - Handler registry keyed by command, numeric or `CTCP_<TAG>`
//! - Built-in replies for PING and the common CTCP queries
//! - Nick collision handling and preferred nick reclaim
//! - Pluggable login actions (`PASS`, NickServ)
//! - Plain TCP or TLS via rustls
//! - Optional `serde` support for [`ClientConfig`] and [`Message`]

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```no_run
//! use slirc_client::{Address, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), slirc_client::ConnectError> {
//!     let client = Client::new("ferris", "ferris", Address::host("irc.libera.chat", 6697));
//!     client.set_use_tls(true);
//!
//!     client.add_handler("001", |client, _| {
//!         let _ = client.join("#rust");
//!     });
//!     client.add_handler("PRIVMSG", |client, msg| {
//!         if let (Some(channel), Some("!ping")) = (msg.param(0), msg.text()) {
//!             let _ = client.privmsg(channel, "pong");
//!         }
//!     });
//!
//!     client.connect().await?;
//!     client.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing Messages
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let message: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(message.source_nickname(), Some("nick"));
//! assert_eq!(message.to_string(), ":nick!user@host PRIVMSG #channel :Hello!");
//! ```

pub mod address;
pub mod auth;
pub mod client;
pub mod config;
pub mod ctcp;
pub mod error;
pub mod handler;
pub mod irc;
pub mod line;
pub mod message;
pub mod prefix;
pub mod transport;

pub use self::address::Address;
pub use self::auth::{AuthAction, MessageSink, NickServAuth, PasswordAuth};
pub use self::client::{Client, ConnectionState};
pub use self::config::{ClientConfig, DEFAULT_VERSION};
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{ClientError, ConnectError, MessageParseError, ProtocolError};
pub use self::handler::{Handler, HandlerRegistry};
pub use self::irc::IrcCodec;
pub use self::line::{LineCodec, MAX_IRC_LINE_LEN};
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::transport::Transport;
