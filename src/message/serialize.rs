//! Message serialization implementation.

use std::fmt::{Display, Formatter, Result as FmtResult};

use super::types::Message;

impl Display for Message {
    /// Writes the wire form without the line terminator.
    ///
    /// The trailing parameter is always written with its `:` marker so that
    /// empty text and text containing spaces survive the round trip.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        f.write_str(&self.command)?;

        for param in &self.params {
            write!(f, " {}", param)?;
        }

        if let Some(ref trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::message::Message;
    use crate::prefix::Prefix;

    #[test]
    fn test_serialize_command_only() {
        assert_eq!(Message::command("LIST").to_string(), "LIST");
    }

    #[test]
    fn test_serialize_params_and_trailing() {
        let msg = Message::kick_with_reason("#chan", "troll", "bye now");
        assert_eq!(msg.to_string(), "KICK #chan troll :bye now");
    }

    #[test]
    fn test_serialize_empty_trailing() {
        let msg = Message::privmsg("#chan", "");
        assert_eq!(msg.to_string(), "PRIVMSG #chan :");
    }

    #[test]
    fn test_serialize_with_prefix() {
        let msg = Message::notice("bob", "hi").with_prefix(Prefix::new("alice", "a", "host"));
        assert_eq!(msg.to_string(), ":alice!a@host NOTICE bob :hi");
    }

    #[test]
    fn test_ctcp_origin_is_not_serialized() {
        let mut msg = Message::command("CTCP_VERSION").with_param("bot");
        msg.ctcp_origin = Some("PRIVMSG".to_string());
        assert_eq!(msg.to_string(), "CTCP_VERSION bot");
    }
}
