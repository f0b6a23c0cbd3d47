//! Message parsing implementation.
//!
//! This module implements `FromStr` for `Message` using the nom-based parser.

use std::str::FromStr;

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

use super::nom_parser::ParsedMessage;
use super::types::Message;

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let parsed = ParsedMessage::parse(line).map_err(|parse_err| {
            ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::ParseContext {
                    position: parse_err.position,
                    context: parse_err
                        .context
                        .unwrap_or("parsing IRC message")
                        .to_owned(),
                },
            }
        })?;

        Ok(Message {
            prefix: parsed.prefix.map(Prefix::new_from_str),
            command: parsed.command.to_ascii_uppercase(),
            params: parsed.params.into_iter().map(str::to_owned).collect(),
            trailing: parsed.trailing.map(str::to_owned),
            ctcp_origin: None,
        })
    }
}
