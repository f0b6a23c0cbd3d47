use crate::prefix::Prefix;

/// An owned IRC message.
///
/// A message is a command, its middle parameters and an optional trailing
/// parameter (the free text after ` :` on the wire).
///
/// # Example
///
/// ```
/// use slirc_client::Message;
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.params, vec!["#channel"]);
/// assert_eq!(msg.trailing.as_deref(), Some("Hello!"));
///
/// let reply = Message::privmsg("#channel", "Hi there");
/// assert_eq!(reply.to_string(), "PRIVMSG #channel :Hi there");
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message prefix/source (e.g., `nick!user@host`).
    pub prefix: Option<Prefix>,
    /// Uppercased command name or three-digit numeric.
    pub command: String,
    /// Middle parameters, in order.
    pub params: Vec<String>,
    /// Trailing free-text parameter.
    pub trailing: Option<String>,
    /// The command this message arrived as, when dispatch rewrote it to a
    /// `CTCP_<TAG>` pseudo-command. Never serialized on the wire.
    pub ctcp_origin: Option<String>,
}

impl Message {
    /// Create a message from a command, middle parameters and trailing text.
    pub fn new<C, P, T>(command: C, params: P, trailing: Option<T>) -> Self
    where
        C: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        T: Into<String>,
    {
        Message {
            prefix: None,
            command: command.into().to_ascii_uppercase(),
            params: params.into_iter().map(Into::into).collect(),
            trailing: trailing.map(Into::into),
            ctcp_origin: None,
        }
    }

    /// Create a message with only a command.
    pub fn command<C: Into<String>>(command: C) -> Self {
        Message::new(command, Vec::<String>::new(), None::<String>)
    }

    /// Append a middle parameter.
    #[must_use]
    pub fn with_param<P: Into<String>>(mut self, param: P) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the trailing parameter.
    #[must_use]
    pub fn with_trailing<T: Into<String>>(mut self, trailing: T) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Set the prefix/source of this message.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Get the nickname from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Get a middle parameter by position.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The trailing text, falling back to the last middle parameter.
    ///
    /// Servers are free to send the final parameter with or without the
    /// `:` marker, so handlers that want "the payload" should use this.
    pub fn text(&self) -> Option<&str> {
        self.trailing
            .as_deref()
            .or_else(|| self.params.last().map(String::as_str))
    }

    /// Returns `true` if this message is a numeric reply.
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }

    /// Create a PRIVMSG message to a target with text
    #[must_use]
    pub fn privmsg<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Message::command("PRIVMSG")
            .with_param(target)
            .with_trailing(text)
    }

    /// Create a NOTICE message to a target with text
    #[must_use]
    pub fn notice<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Message::command("NOTICE")
            .with_param(target)
            .with_trailing(text)
    }

    /// Create a JOIN message for a channel
    #[must_use]
    pub fn join<C: Into<String>>(channel: C) -> Self {
        Message::command("JOIN").with_param(channel)
    }

    /// Create a JOIN message for a channel with a key
    #[must_use]
    pub fn join_with_key<C, K>(channel: C, key: K) -> Self
    where
        C: Into<String>,
        K: Into<String>,
    {
        Message::join(channel).with_param(key)
    }

    /// Create a PART message to leave a channel
    #[must_use]
    pub fn part<C: Into<String>>(channel: C) -> Self {
        Message::command("PART").with_param(channel)
    }

    /// Create a PART message to leave a channel with a message
    #[must_use]
    pub fn part_with_message<C, M>(channel: C, message: M) -> Self
    where
        C: Into<String>,
        M: Into<String>,
    {
        Message::part(channel).with_trailing(message)
    }

    /// Create a NICK message to change nickname
    #[must_use]
    pub fn nick<N: Into<String>>(nickname: N) -> Self {
        Message::command("NICK").with_param(nickname)
    }

    /// Create a USER message for registration
    #[must_use]
    pub fn user<U, R>(username: U, realname: R) -> Self
    where
        U: Into<String>,
        R: Into<String>,
    {
        Message::command("USER")
            .with_param(username)
            .with_param("0.0.0.0")
            .with_param("0.0.0.0")
            .with_trailing(realname)
    }

    /// Create a PASS message
    #[must_use]
    pub fn pass<P: Into<String>>(password: P) -> Self {
        Message::command("PASS").with_param(password)
    }

    /// Create a PING message with a token
    #[must_use]
    pub fn ping<S: Into<String>>(token: S) -> Self {
        Message::command("PING").with_param(token)
    }

    /// Create a PONG message echoing a PING payload
    #[must_use]
    pub fn pong<S: Into<String>>(payload: S) -> Self {
        Message::command("PONG").with_trailing(payload)
    }

    /// Create a QUIT message
    #[must_use]
    pub fn quit() -> Self {
        Message::command("QUIT")
    }

    /// Create a QUIT message with a quit message
    #[must_use]
    pub fn quit_with_message<M: Into<String>>(message: M) -> Self {
        Message::quit().with_trailing(message)
    }

    /// Create a KICK message
    #[must_use]
    pub fn kick<C, N>(channel: C, nickname: N) -> Self
    where
        C: Into<String>,
        N: Into<String>,
    {
        Message::command("KICK").with_param(channel).with_param(nickname)
    }

    /// Create a KICK message with a reason
    #[must_use]
    pub fn kick_with_reason<C, N, R>(channel: C, nickname: N, reason: R) -> Self
    where
        C: Into<String>,
        N: Into<String>,
        R: Into<String>,
    {
        Message::kick(channel, nickname).with_trailing(reason)
    }

    /// Create an AWAY message, which clears the away status
    #[must_use]
    pub fn away() -> Self {
        Message::command("AWAY")
    }

    /// Create an AWAY message with a message
    #[must_use]
    pub fn away_with_message<M: Into<String>>(message: M) -> Self {
        Message::away().with_trailing(message)
    }

    /// Create an INVITE message
    #[must_use]
    pub fn invite<N, C>(nickname: N, channel: C) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Message::command("INVITE").with_param(nickname).with_param(channel)
    }

    /// Create a MODE message for a target with mode changes and arguments
    #[must_use]
    pub fn mode<T, M, A>(target: T, modes: M, args: A) -> Self
    where
        T: Into<String>,
        M: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let mut msg = Message::command("MODE").with_param(target);
        let modes = modes.into();
        if !modes.is_empty() {
            msg.params.push(modes);
        }
        msg.params.extend(args.into_iter().map(Into::into));
        msg
    }

    /// Create an OPER message
    #[must_use]
    pub fn oper<N, P>(name: N, password: P) -> Self
    where
        N: Into<String>,
        P: Into<String>,
    {
        Message::command("OPER").with_param(name).with_param(password)
    }

    /// Create a TOPIC message that sets a channel topic
    #[must_use]
    pub fn topic<C, T>(channel: C, topic: T) -> Self
    where
        C: Into<String>,
        T: Into<String>,
    {
        Message::command("TOPIC").with_param(channel).with_trailing(topic)
    }
}
