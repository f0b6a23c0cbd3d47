//! Outbound commands. Each call queues exactly one message.

use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use super::Client;
use crate::ctcp::Ctcp;
use crate::error::ClientError;
use crate::message::Message;

impl Client {
    /// Queue a message for the write loop.
    ///
    /// Fails with [`ClientError::NotConnected`] when there is no session and
    /// with [`ClientError::QueueFull`] when the outbound queue is full. Never
    /// waits.
    pub fn send(&self, message: Message) -> Result<(), ClientError> {
        let session = self.inner.session.lock();
        let Some(session) = session.as_ref() else {
            return Err(ClientError::NotConnected);
        };
        session.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ClientError::QueueFull,
            TrySendError::Closed(_) => ClientError::NotConnected,
        })
    }

    /// Parse `line` and queue it.
    pub fn send_raw(&self, line: &str) -> Result<(), ClientError> {
        let message = line.parse::<Message>().map_err(ClientError::from)?;
        self.send(message)
    }

    /// Send a CTCP ACTION (`/me`).
    pub fn action(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.privmsg(target, &Ctcp::action(text).to_string())
    }

    /// Send an arbitrary CTCP query.
    pub fn ctcp(&self, target: &str, tag: &str, text: &str) -> Result<(), ClientError> {
        self.privmsg(target, &Ctcp::custom(tag, Some(text)).to_string())
    }

    /// Send a message to a nick or channel.
    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send(Message::privmsg(target, text))
    }

    /// Send a notice to a nick or channel.
    pub fn notice(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send(Message::notice(target, text))
    }

    /// Mark ourselves away with `message`.
    pub fn away(&self, message: &str) -> Result<(), ClientError> {
        self.send(Message::away_with_message(message))
    }

    /// Clear the away status.
    pub fn unaway(&self) -> Result<(), ClientError> {
        self.send(Message::away())
    }

    /// Invite `nick` to `channel`.
    pub fn invite(&self, nick: &str, channel: &str) -> Result<(), ClientError> {
        self.send(Message::invite(nick, channel))
    }

    /// Kick `nick` from `channel`. An empty reason is omitted.
    pub fn kick(&self, channel: &str, nick: &str, reason: &str) -> Result<(), ClientError> {
        let message = if reason.is_empty() {
            Message::kick(channel, nick)
        } else {
            Message::kick_with_reason(channel, nick, reason)
        };
        self.send(message)
    }

    /// Change or query modes on `target`.
    pub fn mode(&self, target: &str, modes: &str, args: &[&str]) -> Result<(), ClientError> {
        self.send(Message::mode(target, modes, args.iter().copied()))
    }

    /// Authenticate as an IRC operator.
    pub fn oper(&self, name: &str, password: &str) -> Result<(), ClientError> {
        self.send(Message::oper(name, password))
    }

    /// Change nick.
    ///
    /// The preferred and live nicks are updated before sending, so this
    /// also configures the nick used by the next connect when offline.
    pub fn set_nick(&self, nick: &str) -> Result<(), ClientError> {
        {
            let mut state = self.inner.state.lock();
            state.preferred_nick = nick.to_owned();
            state.nick = nick.to_owned();
        }
        self.send(Message::nick(nick))
    }

    /// Join `channel`.
    pub fn join(&self, channel: &str) -> Result<(), ClientError> {
        self.send(Message::join(channel))
    }

    /// Join a key-protected `channel`.
    pub fn join_with_key(&self, channel: &str, key: &str) -> Result<(), ClientError> {
        self.send(Message::join_with_key(channel, key))
    }

    /// Leave `channel`. An empty message is omitted.
    pub fn part(&self, channel: &str, message: &str) -> Result<(), ClientError> {
        let message = if message.is_empty() {
            Message::part(channel)
        } else {
            Message::part_with_message(channel, message)
        };
        self.send(message)
    }

    /// List channels, optionally restricted to `channels`.
    pub fn list(&self, channels: &[&str]) -> Result<(), ClientError> {
        let mut message = Message::command("LIST");
        if !channels.is_empty() {
            message = message.with_param(channels.join(","));
        }
        self.send(message)
    }

    /// Set the topic of `channel`.
    pub fn topic(&self, channel: &str, topic: &str) -> Result<(), ClientError> {
        self.send(Message::topic(channel, topic))
    }

    /// Query information about `nick`.
    pub fn whois(&self, nick: &str) -> Result<(), ClientError> {
        self.send(Message::command("WHOIS").with_param(nick))
    }

    /// Query information about a nick that is no longer online.
    pub fn whowas(&self, nick: &str) -> Result<(), ClientError> {
        self.send(Message::command("WHOWAS").with_param(nick))
    }

    /// Query users matching `mask`; `operators_only` adds the `o` flag.
    pub fn who(&self, mask: &str, operators_only: bool) -> Result<(), ClientError> {
        let mut message = Message::command("WHO").with_param(mask);
        if operators_only {
            message = message.with_param("o");
        }
        self.send(message)
    }

    /// Send a PING with `token`.
    pub fn ping(&self, token: &str) -> Result<(), ClientError> {
        self.send(Message::ping(token))
    }

    /// Answer a server PING.
    pub fn pong(&self, payload: &str) -> Result<(), ClientError> {
        self.send(Message::pong(payload))
    }

    /// Send the USER registration message.
    pub fn send_user(&self) -> Result<(), ClientError> {
        let message = {
            let settings = self.inner.settings.read();
            let real_name = if settings.real_name.is_empty() {
                &settings.user
            } else {
                &settings.real_name
            };
            Message::user(settings.user.as_str(), real_name.as_str())
        };
        self.send(message)
    }

    /// Send QUIT and tear the connection down for good.
    ///
    /// The reconnect loop stops once the client has quit.
    pub async fn quit(&self) {
        let message = self.inner.settings.read().quit_message.clone();
        if let Err(e) = self.send(Message::quit_with_message(message)) {
            debug!(error = %e, "QUIT not sent");
        }
        {
            let _session = self.inner.session.lock();
            let mut state = self.inner.state.lock();
            state.quitting = true;
            state.stopped = true;
        }
        self.disconnect().await;
        self.inner
            .lifecycle
            .send_replace(super::ConnectionState::Quit);
    }
}
