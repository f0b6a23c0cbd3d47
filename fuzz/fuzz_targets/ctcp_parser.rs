//! Fuzz target for CTCP demultiplexing

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{handler::demux_ctcp, Ctcp, Message};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Some(ctcp) = Ctcp::parse(text) {
            let _ = ctcp.to_string();
        }

        let mut message = Message::privmsg("target", text);
        if demux_ctcp(&mut message) {
            assert!(message.command.starts_with("CTCP_"));
            assert_eq!(message.ctcp_origin.as_deref(), Some("PRIVMSG"));
        }
    }
});
