//! Login actions run on every successful connect.
//!
//! Actions run in registration order after the transport is up and before
//! the NICK/USER registration is queued, so a `PASS` always reaches the
//! server first.
//!
//! ```
//! use slirc_client::{Address, Client};
//! use slirc_client::auth::{NickServAuth, PasswordAuth};
//!
//! let client = Client::new("bot", "bot", Address::host("irc.example.com", 6667));
//! client.add_auth(PasswordAuth::new("server-password"));
//! client.add_auth(NickServAuth::new("hunter2"));
//! ```

use std::fmt;

use crate::error::ClientError;
use crate::message::Message;

/// The view of a live connection an [`AuthAction`] gets: enough to queue
/// protocol messages, nothing else.
pub trait MessageSink {
    /// Queue a message for transmission.
    fn send(&self, message: Message) -> Result<(), ClientError>;

    /// Queue a PRIVMSG.
    fn privmsg(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send(Message::privmsg(target, text))
    }
}

/// A pluggable login step.
pub trait AuthAction: fmt::Debug + Send + Sync {
    /// Perform the login by queueing whatever messages it needs.
    fn authenticate(&self, sink: &dyn MessageSink) -> Result<(), ClientError>;
}

/// Server password login via `PASS`.
#[derive(Clone)]
pub struct PasswordAuth {
    password: String,
}

impl PasswordAuth {
    /// Create a PASS login.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAuth")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthAction for PasswordAuth {
    fn authenticate(&self, sink: &dyn MessageSink) -> Result<(), ClientError> {
        sink.send(Message::pass(self.password.as_str()))
    }
}

/// Services login via `PRIVMSG NickServ :IDENTIFY <password>`.
#[derive(Clone)]
pub struct NickServAuth {
    service: String,
    password: String,
}

impl NickServAuth {
    /// Identify to `NickServ`.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            service: "NickServ".to_string(),
            password: password.into(),
        }
    }

    /// Identify to a differently named services bot.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

impl fmt::Debug for NickServAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NickServAuth")
            .field("service", &self.service)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthAction for NickServAuth {
    fn authenticate(&self, sink: &dyn MessageSink) -> Result<(), ClientError> {
        sink.privmsg(&self.service, &format!("IDENTIFY {}", self.password))
    }
}
