//! IRC message type, parsing and serialization.

mod nom_parser;
mod parse;
mod serialize;
mod types;

pub use self::nom_parser::{DetailedParseError, ParsedMessage};
pub use self::types::Message;
