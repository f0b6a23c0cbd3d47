//! Error types for the IRC client library.
//!
//! Errors fall into three groups:
//!
//! - [`ConnectError`] is returned synchronously from
//!   [`Client::connect`](crate::Client::connect), either because the client is
//!   misconfigured or because the server could not be reached.
//! - [`ClientError`] is published on the asynchronous error stream
//!   ([`Client::subscribe_errors`](crate::Client::subscribe_errors)) by the
//!   I/O loops. Every completed disconnect publishes [`ClientError::Disconnected`].
//! - [`ProtocolError`] and [`MessageParseError`] come from the line codec and
//!   the message parser.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Protocol-level errors raised while framing or parsing lines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Length of the offending line.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Parsing error with position information.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Byte position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

/// Errors returned by [`Client::connect`](crate::Client::connect).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// No address was configured.
    #[error("no address given")]
    InvalidAddress,

    /// The nickname is empty.
    #[error("no nick given")]
    InvalidNick,

    /// The username is empty.
    #[error("no user given")]
    InvalidUser,

    /// A session is already live; disconnect first.
    #[error("already connected")]
    AlreadyConnected,

    /// The client quit before the connect finished.
    #[error("client quit while connecting")]
    Quitting,

    /// Dialing the server (TCP or TLS handshake) failed.
    #[error("failed to connect to {address}: {source}")]
    Connection {
        /// The dialed address.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The host cannot be used as a TLS server name.
    #[error("invalid TLS server name: {host}")]
    InvalidServerName {
        /// The rejected host.
        host: String,
    },
}

impl ConnectError {
    /// Returns `true` for errors caused by client configuration rather than
    /// the network.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ConnectError::InvalidAddress
                | ConnectError::InvalidNick
                | ConnectError::InvalidUser
                | ConnectError::InvalidServerName { .. }
        )
    }
}

/// Errors published on the client's error stream and returned by the
/// command surface.
///
/// Cloneable so a single error can be broadcast to every subscriber.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Transport read or write failed.
    #[error("io error: {0}")]
    Io(Arc<io::Error>),

    /// A read or write deadline expired.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// `"read"` or `"write"`.
        operation: &'static str,
        /// The deadline that expired.
        after: Duration,
    },

    /// A line could not be framed or parsed.
    #[error("protocol error: {0}")]
    Protocol(Arc<ProtocolError>),

    /// There is no live session to send on.
    #[error("not connected")]
    NotConnected,

    /// The bounded outbound queue is full.
    #[error("outbound queue is full")]
    QueueFull,

    /// A registered handler panicked while handling a message.
    #[error("handler for {command} panicked")]
    HandlerPanicked {
        /// The command being dispatched.
        command: String,
    },

    /// The connection has been torn down.
    #[error("disconnected")]
    Disconnected,
}

impl ClientError {
    /// Returns `true` for the disconnect notification.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, ClientError::Disconnected)
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        ClientError::Io(Arc::new(err))
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(io) => ClientError::Io(Arc::new(io)),
            other => ClientError::Protocol(Arc::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::MessageTooLong {
            actual: 9000,
            limit: 8191,
        };
        assert_eq!(
            format!("{}", err),
            "message too long: 9000 bytes (limit 8191)"
        );

        assert_eq!(ConnectError::InvalidAddress.to_string(), "no address given");
        assert_eq!(ConnectError::InvalidNick.to_string(), "no nick given");
        assert_eq!(ConnectError::InvalidUser.to_string(), "no user given");
        assert!(!ConnectError::Quitting.is_config_error());
    }

    #[test]
    fn test_protocol_error_chaining() {
        let protocol_err = ProtocolError::InvalidMessage {
            string: "!!!".to_string(),
            cause: MessageParseError::EmptyMessage,
        };

        let source = std::error::Error::source(&protocol_err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), "empty message");
    }

    #[test]
    fn test_connection_error_keeps_cause() {
        let err = ConnectError::Connection {
            address: "127.0.0.1:6667".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        };
        assert!(err.to_string().contains("127.0.0.1:6667"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_config_error());
        assert!(ConnectError::InvalidNick.is_config_error());
    }

    #[test]
    fn test_client_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe");
        match ClientError::from(ProtocolError::from(io_err)) {
            ClientError::Io(_) => {}
            other => panic!("Expected Io variant, got {other:?}"),
        }

        let err = ClientError::from(ProtocolError::MessageTooLong {
            actual: 9000,
            limit: 8191,
        });
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(ClientError::Disconnected.is_disconnected());
        assert!(!ClientError::QueueFull.is_disconnected());
    }
}
