//! CTCP (Client-to-Client Protocol) message handling.
//!
//! CTCP payloads travel inside the trailing text of PRIVMSG (queries) and
//! NOTICE (replies), wrapped in the `\x01` delimiter:
//! `\x01TAG optional text\x01`.
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp::{Ctcp, CtcpKind};
//!
//! let ctcp = Ctcp::parse("\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(ctcp.kind, CtcpKind::Action);
//! assert_eq!(ctcp.params, Some("waves hello"));
//!
//! let action = Ctcp::action("dances");
//! assert_eq!(action.to_string(), "\x01ACTION dances\x01");
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// Prefix of the pseudo-commands CTCP queries are dispatched under.
pub const CTCP_COMMAND_PREFIX: &str = "CTCP_";

/// CTCP commands answered by the built-in handlers.
pub const SUPPORTED_CLIENTINFO: &str = "CLIENTINFO PING VERSION TIME USERINFO CLIENTINFO";

/// Known CTCP command types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CtcpKind {
    /// ACTION - describes an action performed by the user (`/me`).
    Action,
    /// VERSION - requests client version information.
    Version,
    /// PING - measures round-trip latency.
    Ping,
    /// TIME - requests local time from the client.
    Time,
    /// USERINFO - requests user-defined information.
    Userinfo,
    /// CLIENTINFO - requests list of supported CTCP commands.
    Clientinfo,
    /// Unknown or custom CTCP command, stored uppercased.
    Unknown(String),
}

impl CtcpKind {
    /// Parse a CTCP command name into a `CtcpKind`.
    pub fn parse(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "ACTION" => Self::Action,
            "VERSION" => Self::Version,
            "PING" => Self::Ping,
            "TIME" => Self::Time,
            "USERINFO" => Self::Userinfo,
            "CLIENTINFO" => Self::Clientinfo,
            _ => Self::Unknown(upper),
        }
    }

    /// Returns the canonical uppercase name of this CTCP command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Action => "ACTION",
            Self::Version => "VERSION",
            Self::Ping => "PING",
            Self::Time => "TIME",
            Self::Userinfo => "USERINFO",
            Self::Clientinfo => "CLIENTINFO",
            Self::Unknown(s) => s,
        }
    }

    /// The pseudo-command handlers for this kind are registered under,
    /// e.g. `CTCP_VERSION`.
    pub fn dispatch_command(&self) -> String {
        format!("{}{}", CTCP_COMMAND_PREFIX, self.as_str())
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed CTCP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The CTCP command type.
    pub kind: CtcpKind,
    /// Optional parameters following the command.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a CTCP message from a PRIVMSG/NOTICE body.
    ///
    /// Returns `None` if the text is not CTCP. A missing closing delimiter
    /// is tolerated.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);

        if text.is_empty() {
            return None;
        }

        let (command, params) = match text.find(' ') {
            Some(pos) => {
                let params = &text[pos + 1..];
                (&text[..pos], (!params.is_empty()).then_some(params))
            }
            None => (text, None),
        };

        if command.is_empty() {
            return None;
        }

        Some(Self {
            kind: CtcpKind::parse(command),
            params,
        })
    }

    /// Check if a message body starts like a CTCP message.
    #[inline]
    pub fn is_ctcp(text: &str) -> bool {
        text.starts_with(CTCP_DELIM)
    }

    /// Create an ACTION CTCP message.
    pub fn action(text: &'a str) -> Self {
        Self {
            kind: CtcpKind::Action,
            params: Some(text),
        }
    }

    /// Create a VERSION reply.
    pub fn version_reply(version: &'a str) -> Self {
        Self {
            kind: CtcpKind::Version,
            params: Some(version),
        }
    }

    /// Create a USERINFO reply.
    pub fn userinfo_reply(info: &'a str) -> Self {
        Self {
            kind: CtcpKind::Userinfo,
            params: Some(info),
        }
    }

    /// Create a CLIENTINFO reply listing supported commands.
    pub fn clientinfo_reply(commands: &'a str) -> Self {
        Self {
            kind: CtcpKind::Clientinfo,
            params: Some(commands),
        }
    }

    /// Create a TIME reply.
    pub fn time_reply(time: &'a str) -> Self {
        Self {
            kind: CtcpKind::Time,
            params: Some(time),
        }
    }

    /// Create a PING request or reply carrying `token`.
    pub fn ping(token: &'a str) -> Self {
        Self {
            kind: CtcpKind::Ping,
            params: (!token.is_empty()).then_some(token),
        }
    }

    /// Create a custom CTCP message.
    pub fn custom(command: &str, params: Option<&'a str>) -> Self {
        Self {
            kind: CtcpKind::parse(command),
            params: params.filter(|p| !p.is_empty()),
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x01{}", self.kind)?;
        if let Some(params) = self.params {
            write!(f, " {}", params)?;
        }
        write!(f, "\x01")
    }
}

/// Current local time in the format used for TIME replies.
pub fn local_time() -> String {
    chrono::Local::now().to_rfc2822()
}
