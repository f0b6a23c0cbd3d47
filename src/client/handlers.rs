//! Standard handlers installed on every client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::io::unix_nanos;
use super::Client;
use crate::ctcp::{self, Ctcp, SUPPORTED_CLIENTINFO};
use crate::handler::{Handler, HandlerRegistry};
use crate::message::Message;

/// Nicks at least this long get the underscore prepended instead of appended.
const COLLISION_PREFIX_LEN: usize = 9;

/// The nick to try when `nick` is taken: `_nick` for nicks of nine or more
/// characters, `nick_` otherwise.
///
/// ```
/// use slirc_client::client::collision_nick;
///
/// assert_eq!(collision_nick("ferris"), "ferris_");
/// assert_eq!(collision_nick("ferriscrab"), "_ferriscrab");
/// ```
pub fn collision_nick(nick: &str) -> String {
    if nick.chars().count() >= COLLISION_PREFIX_LEN {
        format!("_{}", nick)
    } else {
        format!("{}_", nick)
    }
}

pub(super) fn install(registry: &mut HandlerRegistry) {
    let mut add = |code: &str, handler: Handler| {
        registry.add(code, handler);
    };

    add("ERROR", Arc::new(|client: &Client, _: &Message| client.request_disconnect()));
    add("PING", Arc::new(on_ping));
    add("PONG", Arc::new(on_pong));

    add(
        "CTCP_VERSION",
        Arc::new(|client: &Client, msg: &Message| {
            let version = client.version();
            ctcp_reply(client, msg, Ctcp::version_reply(&version));
        }),
    );
    add(
        "CTCP_USERINFO",
        Arc::new(|client: &Client, msg: &Message| {
            let user = client.user();
            ctcp_reply(client, msg, Ctcp::userinfo_reply(&user));
        }),
    );
    add(
        "CTCP_CLIENTINFO",
        Arc::new(|client: &Client, msg: &Message| {
            ctcp_reply(client, msg, Ctcp::clientinfo_reply(SUPPORTED_CLIENTINFO));
        }),
    );
    add(
        "CTCP_TIME",
        Arc::new(|client: &Client, msg: &Message| {
            let now = ctcp::local_time();
            ctcp_reply(client, msg, Ctcp::time_reply(&now));
        }),
    );
    add(
        "CTCP_PING",
        Arc::new(|client: &Client, msg: &Message| {
            let token = msg.trailing.as_deref().unwrap_or_default();
            ctcp_reply(client, msg, Ctcp::ping(token));
        }),
    );

    add("433", Arc::new(on_nick_unavailable));
    add("437", Arc::new(on_nick_unavailable));
    add("NICK", Arc::new(on_nick));
    add("001", Arc::new(on_welcome));
}

fn on_ping(client: &Client, msg: &Message) {
    let payload = msg.text().unwrap_or_default();
    if let Err(e) = client.pong(payload) {
        warn!(error = %e, "failed to queue PONG");
    }
}

fn on_pong(client: &Client, msg: &Message) {
    let Some(sent) = msg.text().and_then(|text| text.parse::<u128>().ok()) else {
        return;
    };
    let now = unix_nanos();
    if sent > now {
        return;
    }
    let lag = Duration::from_nanos(u64::try_from(now - sent).unwrap_or(u64::MAX));
    debug!(?lag, "lag");
    client.set_lag(lag);
}

/// Answer a CTCP query with a NOTICE to its sender.
///
/// Only queries that arrived as PRIVMSG are answered; a CTCP inside a NOTICE
/// is already a reply.
fn ctcp_reply(client: &Client, msg: &Message, reply: Ctcp<'_>) {
    if msg.ctcp_origin.as_deref() != Some("PRIVMSG") {
        return;
    }
    let Some(target) = msg.source_nickname() else {
        return;
    };
    if let Err(e) = client.notice(target, &reply.to_string()) {
        warn!(error = %e, target, "failed to queue CTCP reply");
    }
}

fn on_nick_unavailable(client: &Client, _: &Message) {
    let next = collision_nick(&client.nick());
    debug!(nick = %next, "nick unavailable, trying another");
    client.set_live_nick(next.as_str());
    if let Err(e) = client.send(Message::nick(next)) {
        warn!(error = %e, "failed to queue NICK");
    }
}

fn on_nick(client: &Client, msg: &Message) {
    let Some(new_nick) = msg.text() else {
        return;
    };
    if msg.source_nickname() == Some(client.nick().as_str()) {
        client.set_live_nick(new_nick);
    }
}

fn on_welcome(client: &Client, msg: &Message) {
    if let Some(nick) = msg.param(0) {
        client.set_live_nick(nick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn client() -> Client {
        Client::new("ferris", "crab", Address::host("localhost", 6667))
    }

    #[test]
    fn test_collision_nick() {
        assert_eq!(collision_nick("nick"), "nick_");
        assert_eq!(collision_nick("eightchr"), "eightchr_");
        assert_eq!(collision_nick("ninechars"), "_ninechars");
        assert_eq!(collision_nick("_ninechars"), "__ninechars");
    }

    #[test]
    fn test_collision_updates_live_nick_only() {
        let client = client();
        client.run_handlers(":server 433 * ferris :Nickname is already in use".parse().unwrap());
        assert_eq!(client.nick(), "ferris_");
        assert_eq!(client.preferred_nick(), "ferris");

        client.run_handlers(":server 437 * ferris_ :Nick unavailable".parse().unwrap());
        assert_eq!(client.nick(), "ferris__");
        assert_eq!(client.preferred_nick(), "ferris");
    }

    #[test]
    fn test_welcome_sets_live_nick() {
        let client = client();
        client.run_handlers(":server 001 ferris_ :Welcome".parse().unwrap());
        assert_eq!(client.nick(), "ferris_");
    }

    #[test]
    fn test_nick_change_follows_own_nick() {
        let client = client();
        client.run_handlers(":someone!u@h NICK :other".parse().unwrap());
        assert_eq!(client.nick(), "ferris");

        client.run_handlers(":ferris!crab@h NICK :rustacean".parse().unwrap());
        assert_eq!(client.nick(), "rustacean");
        assert_eq!(client.preferred_nick(), "ferris");

        client.run_handlers(":rustacean!crab@h NICK ferris".parse().unwrap());
        assert_eq!(client.nick(), "ferris");
    }

    #[test]
    fn test_pong_records_lag() {
        let client = client();
        assert!(client.lag().is_none());
        let sent = unix_nanos() - 5_000_000;
        client.run_handlers(format!(":server PONG server :{}", sent).parse().unwrap());
        assert!(client.lag().unwrap() >= Duration::from_millis(5));
    }

    #[test]
    fn test_pong_ignores_foreign_payload() {
        let client = client();
        client.run_handlers(":server PONG server :abc".parse().unwrap());
        assert!(client.lag().is_none());
    }
}
