//! The reconnect supervisor.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Client, ConnectionState};
use crate::error::ConnectError;

impl Client {
    /// Keep the client connected until it quits.
    ///
    /// An idle client connects first. Whenever the connection drops, the
    /// client redials after `reconnect_delay * attempt` (the attempt number
    /// is capped by [`ClientConfig::max_reconnect_attempt`]) and resets the
    /// attempt counter once a dial succeeds. Every connect error is retried,
    /// including configuration errors. A session brought up by a direct
    /// [`connect`](Self::connect) in the meantime counts as a success.
    /// Returns after [`quit`](Self::quit).
    ///
    /// [`ClientConfig::max_reconnect_attempt`]: crate::ClientConfig::max_reconnect_attempt
    pub async fn run(&self) {
        let mut states = self.subscribe_state();

        if self.state() == ConnectionState::Idle {
            if let Err(e) = self.connect().await {
                warn!(error = %e, "initial connect failed");
                if !self.reconnect(&mut states).await {
                    return self.finish();
                }
            }
        }

        loop {
            if self.is_quitting() {
                break;
            }
            let state = *states.borrow_and_update();
            match state {
                ConnectionState::Quit => break,
                // Reconnecting with nobody redialing: a direct connect made
                // from that state failed and restored it.
                ConnectionState::Disconnected | ConnectionState::Reconnecting => {
                    if !self.reconnect(&mut states).await {
                        break;
                    }
                }
                _ => {
                    if states.changed().await.is_err() {
                        break;
                    }
                }
            }
        }

        self.finish();
    }

    /// Redial until a connect succeeds. Returns `false` if the client quit
    /// while waiting.
    async fn reconnect(&self, states: &mut watch::Receiver<ConnectionState>) -> bool {
        {
            let _session = self.inner.session.lock();
            if self.is_quitting() {
                return false;
            }
            self.inner
                .lifecycle
                .send_replace(ConnectionState::Reconnecting);
        }

        loop {
            let (attempt, delay) = {
                let attempt = self.inner.state.lock().reconnect_attempt;
                (attempt, self.config().reconnect_delay_for(attempt))
            };
            debug!(attempt, ?delay, "waiting to reconnect");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_quit(states) => return false,
            }
            if self.is_quitting() {
                return false;
            }

            match self.connect().await {
                Ok(()) => {
                    info!(attempt, "reconnected");
                    self.inner.state.lock().reconnect_attempt = 1;
                    return true;
                }
                Err(ConnectError::Quitting) => return false,
                Err(ConnectError::AlreadyConnected) => {
                    debug!(attempt, state = %self.state(), "session already up");
                    self.inner.state.lock().reconnect_attempt = 1;
                    return true;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "reconnect failed");
                    let cap = self.config().max_reconnect_attempt.max(1);
                    let mut state = self.inner.state.lock();
                    state.reconnect_attempt = state.reconnect_attempt.saturating_add(1).min(cap);
                }
            }
        }
    }

    fn finish(&self) {
        if self.is_quitting() {
            self.inner.lifecycle.send_replace(ConnectionState::Quit);
        }
        debug!("reconnect loop finished");
    }
}

async fn wait_for_quit(states: &mut watch::Receiver<ConnectionState>) {
    loop {
        if *states.borrow_and_update() == ConnectionState::Quit {
            return;
        }
        if states.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
