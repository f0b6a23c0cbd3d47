//! The connection engine.
//!
//! A [`Client`] owns at most one live session at a time. A session is the
//! transport, the bounded outbound queue, a stop token and the three tasks
//! that drive the connection:
//!
//! - the read loop frames lines, parses them and dispatches handlers;
//! - the write loop drains the outbound queue onto the socket;
//! - the ping loop keeps the connection alive and reclaims the preferred nick.
//!
//! Lifecycle changes are published on a [`watch`] channel
//! ([`Client::subscribe_state`]); asynchronous failures are published on a
//! [`broadcast`] channel ([`Client::subscribe_errors`]).
//!
//! ```no_run
//! use slirc_client::{Address, Client};
//!
//! # async fn demo() -> Result<(), slirc_client::ConnectError> {
//! let client = Client::new("ferris", "ferris", Address::host("irc.libera.chat", 6697));
//! client.set_use_tls(true);
//! client.add_handler("001", |client, _msg| {
//!     let _ = client.join("#rust");
//! });
//! client.connect().await?;
//! client.run().await;
//! # Ok(())
//! # }
//! ```

mod commands;
mod handlers;
mod io;
mod reconnect;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_rustls::rustls;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::address::Address;
use crate::auth::{AuthAction, MessageSink};
use crate::config::{ClientConfig, DEFAULT_VERSION};
use crate::error::{ClientError, ConnectError};
use crate::handler::{self, Handler, HandlerRegistry};
use crate::message::Message;
use crate::transport::{self, Transport};

pub use self::handlers::collision_nick;

/// Capacity of the error broadcast channel.
const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Where a client is in its connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Never connected.
    Idle,
    /// Dialing the server.
    Connecting,
    /// A session is live.
    Connected,
    /// The session is being torn down.
    Disconnecting,
    /// No session; the reconnect loop may bring one up again.
    Disconnected,
    /// The reconnect loop is waiting to redial.
    Reconnecting,
    /// The user quit. Terminal.
    Quit,
}

impl ConnectionState {
    /// Returns `true` for the states [`Client::connect`] may start from.
    pub fn can_connect(self) -> bool {
        matches!(
            self,
            ConnectionState::Idle | ConnectionState::Disconnected | ConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Quit => "quit",
        };
        f.write_str(name)
    }
}

/// Mutable connection state shared with the loops.
struct State {
    /// Nick the server currently knows us by.
    nick: String,
    /// Nick the user asked for.
    preferred_nick: String,
    stopped: bool,
    quitting: bool,
    last_message: Instant,
    lag: Option<Duration>,
    reconnect_attempt: u32,
}

/// User-supplied settings.
struct Settings {
    user: String,
    real_name: String,
    quit_message: String,
    version: String,
    address: Option<Address>,
    use_tls: bool,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    config: ClientConfig,
}

/// One live connection.
struct Session {
    sender: mpsc::Sender<Message>,
    stop: CancellationToken,
    local_addr: Option<SocketAddr>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    pinger: JoinHandle<()>,
}

struct Inner {
    state: Mutex<State>,
    settings: RwLock<Settings>,
    session: Mutex<Option<Session>>,
    auth: RwLock<Vec<Arc<dyn AuthAction>>>,
    handlers: RwLock<HandlerRegistry>,
    lifecycle: watch::Sender<ConnectionState>,
    errors: broadcast::Sender<ClientError>,
}

/// A handle to an IRC connection.
///
/// Cloning is cheap; every clone drives the same connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("nick", &self.nick())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with default configuration.
    ///
    /// Pass `None` as the address to configure it later with
    /// [`set_address`](Self::set_address).
    pub fn new(
        nick: impl Into<String>,
        user: impl Into<String>,
        address: impl Into<Option<Address>>,
    ) -> Self {
        Self::with_config(nick, user, address, ClientConfig::default())
    }

    /// Create a client with explicit timing configuration.
    pub fn with_config(
        nick: impl Into<String>,
        user: impl Into<String>,
        address: impl Into<Option<Address>>,
        config: ClientConfig,
    ) -> Self {
        let nick = nick.into();
        let (lifecycle, _) = watch::channel(ConnectionState::Idle);
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let mut registry = HandlerRegistry::new();
        handlers::install(&mut registry);

        Client {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    nick: nick.clone(),
                    preferred_nick: nick,
                    stopped: false,
                    quitting: false,
                    last_message: Instant::now(),
                    lag: None,
                    reconnect_attempt: 1,
                }),
                settings: RwLock::new(Settings {
                    user: user.into(),
                    real_name: String::new(),
                    quit_message: DEFAULT_VERSION.to_string(),
                    version: DEFAULT_VERSION.to_string(),
                    address: address.into(),
                    use_tls: false,
                    tls_config: None,
                    config,
                }),
                session: Mutex::new(None),
                auth: RwLock::new(Vec::new()),
                handlers: RwLock::new(registry),
                lifecycle,
                errors,
            }),
        }
    }

    // Settings

    /// Set the message sent with QUIT.
    pub fn set_quit_message(&self, message: impl Into<String>) {
        self.inner.settings.write().quit_message = message.into();
    }

    /// Set the real name sent with USER. Empty means "same as the user".
    pub fn set_real_name(&self, real_name: impl Into<String>) {
        self.inner.settings.write().real_name = real_name.into();
    }

    /// Set the string used for CTCP VERSION replies.
    pub fn set_version(&self, version: impl Into<String>) {
        self.inner.settings.write().version = version.into();
    }

    /// Enable or disable TLS for future connects.
    pub fn set_use_tls(&self, use_tls: bool) {
        self.inner.settings.write().use_tls = use_tls;
    }

    /// Use a custom TLS configuration instead of the bundled web PKI roots.
    pub fn set_tls_config(&self, config: Arc<rustls::ClientConfig>) {
        self.inner.settings.write().tls_config = Some(config);
    }

    /// Set the server address for future connects.
    pub fn set_address(&self, address: Address) {
        self.inner.settings.write().address = Some(address);
    }

    /// Replace the timing configuration for future connects.
    pub fn set_config(&self, config: ClientConfig) {
        self.inner.settings.write().config = config;
    }

    /// Register a login action, run on every successful connect.
    pub fn add_auth(&self, action: impl AuthAction + 'static) {
        self.inner.auth.write().push(Arc::new(action));
    }

    // Getters

    /// The nick the server currently knows us by.
    pub fn nick(&self) -> String {
        self.inner.state.lock().nick.clone()
    }

    /// The nick the user asked for.
    pub fn preferred_nick(&self) -> String {
        self.inner.state.lock().preferred_nick.clone()
    }

    /// The username sent with USER.
    pub fn user(&self) -> String {
        self.inner.settings.read().user.clone()
    }

    /// The real name sent with USER.
    pub fn real_name(&self) -> String {
        self.inner.settings.read().real_name.clone()
    }

    /// The CTCP VERSION reply.
    pub fn version(&self) -> String {
        self.inner.settings.read().version.clone()
    }

    /// The configured server address.
    pub fn address(&self) -> Option<Address> {
        self.inner.settings.read().address.clone()
    }

    /// A copy of the timing configuration.
    pub fn config(&self) -> ClientConfig {
        self.inner.settings.read().config.clone()
    }

    /// Round trip time measured by the last PING/PONG exchange.
    pub fn lag(&self) -> Option<Duration> {
        self.inner.state.lock().lag
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.lifecycle.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.lifecycle.subscribe()
    }

    /// Receive asynchronous errors from the I/O loops.
    ///
    /// Every completed disconnect publishes [`ClientError::Disconnected`].
    pub fn subscribe_errors(&self) -> broadcast::Receiver<ClientError> {
        self.inner.errors.subscribe()
    }

    /// Returns `true` while a session is live and no stop or quit is pending.
    pub fn is_connected(&self) -> bool {
        let session = self.inner.session.lock();
        if session.is_none() {
            return false;
        }
        let state = self.inner.state.lock();
        !state.stopped && !state.quitting
    }

    /// Local address of the live session's socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner
            .session
            .lock()
            .as_ref()
            .and_then(|session| session.local_addr)
    }

    /// The attempt number the reconnect loop uses for its next redial.
    ///
    /// Starts at 1, grows with each failed redial and resets to 1 after a
    /// successful connect.
    pub fn reconnect_attempt(&self) -> u32 {
        self.inner.state.lock().reconnect_attempt
    }

    fn is_quitting(&self) -> bool {
        self.inner.state.lock().quitting
    }

    // Lifecycle

    /// Dial the server and start a session.
    ///
    /// Returns once the transport is up and the registration (login actions,
    /// NICK, USER) is queued. It does not wait for the server to welcome us.
    ///
    /// A [`quit`](Self::quit) that lands while the dial is in flight wins:
    /// the new transport is dropped and [`ConnectError::Quitting`] returned.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let (previous, address, tls, config, nick) = {
            let session = self.inner.session.lock();
            let previous = *self.inner.lifecycle.borrow();
            if session.is_some() || !previous.can_connect() {
                return Err(ConnectError::AlreadyConnected);
            }
            if self.is_quitting() {
                return Err(ConnectError::Quitting);
            }

            let mut settings = self.inner.settings.write();
            let address = settings
                .address
                .clone()
                .filter(|address| !address.hostname().is_empty())
                .ok_or(ConnectError::InvalidAddress)?;
            let nick = self.inner.state.lock().preferred_nick.clone();
            if nick.is_empty() {
                return Err(ConnectError::InvalidNick);
            }
            if settings.user.is_empty() {
                return Err(ConnectError::InvalidUser);
            }
            if settings.real_name.is_empty() {
                settings.real_name = settings.user.clone();
            }

            let tls = settings.use_tls.then(|| {
                settings
                    .tls_config
                    .clone()
                    .unwrap_or_else(transport::default_tls_config)
            });

            self.inner.lifecycle.send_replace(ConnectionState::Connecting);
            (previous, address, tls, settings.config.clone(), nick)
        };

        debug!(address = %address, tls = tls.is_some(), "connecting");
        let transport =
            match Transport::dial(&address, tls, config.timeout, config.tcp_keepalive).await {
                Ok(transport) => transport,
                Err(e) => {
                    let _session = self.inner.session.lock();
                    if !self.is_quitting() {
                        self.inner.lifecycle.send_replace(previous);
                    }
                    return Err(e);
                }
            };

        self.start_session(transport, &config)?;
        debug!(address = %address, "connected");

        for action in self.auth_actions() {
            if let Err(e) = action.authenticate(self) {
                warn!(action = ?action, error = %e, "login action failed");
            }
        }
        if let Err(e) = self.set_nick(&nick) {
            warn!(error = %e, "failed to queue NICK");
        }
        if let Err(e) = self.send_user() {
            warn!(error = %e, "failed to queue USER");
        }
        Ok(())
    }

    /// Spawn the loops and install the session.
    ///
    /// The session lock is held while the loops are spawned so that a loop
    /// failing immediately cannot request a disconnect before the session
    /// it belongs to is visible. [`quit`](Self::quit) sets its flag under the
    /// same lock, so a quit during the dial is always seen here.
    fn start_session(
        &self,
        transport: Transport,
        config: &ClientConfig,
    ) -> Result<(), ConnectError> {
        let mut session = self.inner.session.lock();
        if self.is_quitting() || *self.inner.lifecycle.borrow() == ConnectionState::Quit {
            debug!("quit while dialing, dropping the transport");
            return Err(ConnectError::Quitting);
        }

        let local_addr = transport.local_addr().ok();
        let (reader, writer) = transport.into_split();
        let (sender, queue) = mpsc::channel(config.queue_capacity.max(1));
        let stop = CancellationToken::new();

        {
            let mut state = self.inner.state.lock();
            state.stopped = false;
            state.last_message = Instant::now();
            state.lag = None;
        }

        let reader = tokio::spawn(io::read_loop(
            self.clone(),
            reader,
            stop.clone(),
            config.read_deadline(),
            config.max_line_len,
        ));
        let writer = tokio::spawn(io::write_loop(
            self.clone(),
            writer,
            queue,
            stop.clone(),
            config.timeout,
        ));
        let pinger = tokio::spawn(io::ping_loop(
            self.clone(),
            stop.clone(),
            io::PingSchedule::from_config(config),
        ));

        *session = Some(Session {
            sender,
            stop,
            local_addr,
            reader,
            writer,
            pinger,
        });
        self.inner.lifecycle.send_replace(ConnectionState::Connected);
        Ok(())
    }

    fn auth_actions(&self) -> Vec<Arc<dyn AuthAction>> {
        self.inner.auth.read().clone()
    }

    /// Tear down the live session.
    ///
    /// Queued lines get up to the write timeout to drain, then every loop is
    /// stopped and joined. Safe to call repeatedly and concurrently; callers
    /// that find no session wait until an in-flight teardown completes.
    pub async fn disconnect(&self) {
        let taken = {
            let mut guard = self.inner.session.lock();
            let taken = guard.take();
            if taken.is_some() {
                self.inner.state.lock().stopped = true;
                self.inner
                    .lifecycle
                    .send_replace(ConnectionState::Disconnecting);
            }
            taken
        };

        let Some(session) = taken else {
            self.wait_while_disconnecting().await;
            return;
        };

        let Session {
            sender,
            stop,
            reader,
            mut writer,
            pinger,
            ..
        } = session;

        drop(sender);
        let drain = self.inner.settings.read().config.timeout;
        let drained = tokio::time::timeout(drain, &mut writer).await.is_ok();
        stop.cancel();
        if !drained {
            let _ = writer.await;
        }
        let _ = reader.await;
        let _ = pinger.await;

        let next = if self.is_quitting() {
            ConnectionState::Quit
        } else {
            ConnectionState::Disconnected
        };
        self.inner.lifecycle.send_replace(next);
        debug!(state = %next, "disconnected");
        self.report(ClientError::Disconnected);
    }

    async fn wait_while_disconnecting(&self) {
        let mut states = self.subscribe_state();
        loop {
            let state = *states.borrow_and_update();
            if state != ConnectionState::Disconnecting {
                return;
            }
            if states.changed().await.is_err() {
                return;
            }
        }
    }

    /// Schedule a [`disconnect`](Self::disconnect) on the runtime.
    ///
    /// This is what loops and handlers use; it never blocks.
    pub fn request_disconnect(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let client = self.clone();
                runtime.spawn(async move { client.disconnect().await });
            }
            Err(_) => warn!("disconnect requested outside a tokio runtime"),
        }
    }

    /// Publish an error to subscribers.
    pub(crate) fn report(&self, error: ClientError) {
        if !error.is_disconnected() {
            debug!(error = %error, "client error");
        }
        let _ = self.inner.errors.send(error);
    }

    pub(crate) fn touch(&self) {
        self.inner.state.lock().last_message = Instant::now();
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.inner.state.lock().last_message.elapsed()
    }

    pub(crate) fn set_live_nick(&self, nick: impl Into<String>) {
        self.inner.state.lock().nick = nick.into();
    }

    pub(crate) fn set_lag(&self, lag: Duration) {
        self.inner.state.lock().lag = Some(lag);
    }

    // Handlers

    /// Register `handler` for `code` (a command, a numeric or `CTCP_<TAG>`)
    /// and return its index.
    pub fn add_handler<F>(&self, code: &str, handler: F) -> usize
    where
        F: Fn(&Client, &Message) + Send + Sync + 'static,
    {
        self.inner.handlers.write().add(code, Arc::new(handler))
    }

    /// Remove the handler at `index` for `code`. Out of range is a no-op.
    pub fn remove_handler(&self, code: &str, index: usize) -> bool {
        self.inner.handlers.write().remove(code, index)
    }

    /// The handlers registered for `code`, or `None` if there are none.
    pub fn handlers(&self, code: &str) -> Option<Vec<Handler>> {
        self.inner.handlers.read().get(code).map(<[Handler]>::to_vec)
    }

    /// Dispatch `message` to its handlers as if it had just been read.
    ///
    /// CTCP carried in PRIVMSG or NOTICE is rewritten to its `CTCP_<TAG>`
    /// pseudo-command first.
    pub fn run_handlers(&self, mut message: Message) {
        handler::demux_ctcp(&mut message);
        let handlers = self.inner.handlers.read().snapshot(&message.command);
        let panicked = handler::invoke_all(&handlers, self, &message);
        for _ in 0..panicked {
            self.report(ClientError::HandlerPanicked {
                command: message.command.clone(),
            });
        }
    }
}

impl MessageSink for Client {
    fn send(&self, message: Message) -> Result<(), ClientError> {
        Client::send(self, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client() -> Client {
        Client::new("tester", "tester", Address::host("localhost", 6667))
    }

    #[test]
    fn test_new_client_is_idle() {
        let client = client();
        assert_eq!(client.state(), ConnectionState::Idle);
        assert!(!client.is_connected());
        assert_eq!(client.nick(), "tester");
        assert_eq!(client.preferred_nick(), "tester");
        assert_eq!(client.version(), DEFAULT_VERSION);
        assert!(client.local_addr().is_none());
    }

    #[test]
    fn test_standard_handlers_installed() {
        let client = client();
        for code in ["PING", "PONG", "ERROR", "001", "433", "437", "NICK", "CTCP_VERSION"] {
            assert!(client.handlers(code).is_some(), "missing handler for {code}");
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let client = client();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            client.add_handler("privmsg", move |_, _| order.lock().push(i));
        }

        client.run_handlers(":a!b@c PRIVMSG #x :hi".parse().unwrap());
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_handler_panic_is_isolated() {
        let client = client();
        let mut errors = client.subscribe_errors();
        let calls = Arc::new(AtomicUsize::new(0));

        client.add_handler("TOPIC", |_, _| panic!("boom"));
        let counter = calls.clone();
        client.add_handler("TOPIC", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.run_handlers(":a!b@c TOPIC #x :new".parse().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match errors.try_recv() {
            Ok(ClientError::HandlerPanicked { command }) => assert_eq!(command, "TOPIC"),
            other => panic!("expected HandlerPanicked, got {other:?}"),
        }
    }

    #[test]
    fn test_handler_may_register_handlers() {
        let client = client();
        client.add_handler("JOIN", |client, _| {
            client.add_handler("JOIN", |_, _| {});
        });

        client.run_handlers(":a!b@c JOIN #x".parse().unwrap());
        assert_eq!(client.handlers("JOIN").map(|h| h.len()), Some(2));
    }

    #[test]
    fn test_send_without_session() {
        let client = client();
        assert!(matches!(
            client.send(Message::privmsg("#x", "hi")),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_validates_configuration() {
        let client = Client::new("nick", "user", None::<Address>);
        assert!(matches!(
            client.connect().await,
            Err(ConnectError::InvalidAddress)
        ));

        let client = Client::new("", "user", Address::host("localhost", 6667));
        assert!(matches!(client.connect().await, Err(ConnectError::InvalidNick)));

        let client = Client::new("nick", "", Address::host("localhost", 6667));
        assert!(matches!(client.connect().await, Err(ConnectError::InvalidUser)));
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_noop() {
        let client = client();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
        assert_eq!(client.state(), ConnectionState::Idle);
    }
}
