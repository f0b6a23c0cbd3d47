//! Handler registry and CTCP demultiplexing.
//!
//! Handlers are plain closures bound to an uppercase command name (or a
//! numeric, or a `CTCP_<TAG>` pseudo-command). Registration order is
//! dispatch order.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::client::Client;
use crate::ctcp::Ctcp;
use crate::message::Message;

/// A message handler.
///
/// Handlers run synchronously on the read loop: a slow handler delays every
/// message behind it. Spawn a task for anything that blocks.
pub type Handler = Arc<dyn Fn(&Client, &Message) + Send + Sync>;

/// Command name -> ordered handlers.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `code` and return its index.
    ///
    /// The index stays valid only until an earlier handler for the same code
    /// is removed.
    pub fn add(&mut self, code: &str, handler: Handler) -> usize {
        let list = self.handlers.entry(code.to_ascii_uppercase()).or_default();
        list.push(handler);
        list.len() - 1
    }

    /// Remove the handler at `index` for `code`.
    ///
    /// Unknown codes and indices outside `0..len` are ignored. Removing the
    /// last handler for a code forgets the code entirely. Returns whether a
    /// handler was removed.
    pub fn remove(&mut self, code: &str, index: usize) -> bool {
        let code = code.to_ascii_uppercase();
        let Some(list) = self.handlers.get_mut(&code) else {
            return false;
        };
        if index >= list.len() {
            return false;
        }
        list.remove(index);
        if list.is_empty() {
            self.handlers.remove(&code);
        }
        true
    }

    /// Handlers registered for `code`, or `None` if there are none.
    pub fn get(&self, code: &str) -> Option<&[Handler]> {
        self.handlers
            .get(&code.to_ascii_uppercase())
            .map(Vec::as_slice)
    }

    /// Clone of the handler list for `code`, empty if none.
    pub(crate) fn snapshot(&self, code: &str) -> Vec<Handler> {
        self.handlers.get(code).cloned().unwrap_or_default()
    }

    /// Number of codes with at least one handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Rewrite a CTCP-carrying PRIVMSG or NOTICE into its `CTCP_<TAG>`
/// pseudo-command.
///
/// The trailing text becomes the CTCP payload (`None` when empty) and
/// [`Message::ctcp_origin`] records the original command. Returns whether
/// the message was rewritten.
pub fn demux_ctcp(message: &mut Message) -> bool {
    if message.command != "PRIVMSG" && message.command != "NOTICE" {
        return false;
    }
    let Some(ctcp) = message.trailing.as_deref().and_then(Ctcp::parse) else {
        return false;
    };

    let command = ctcp.kind.dispatch_command();
    let payload = ctcp.params.map(str::to_owned);

    message.ctcp_origin = Some(std::mem::replace(&mut message.command, command));
    message.trailing = payload;
    true
}

/// Call each handler in order, isolating panics.
///
/// Returns the number of handlers that panicked.
pub(crate) fn invoke_all(handlers: &[Handler], client: &Client, message: &Message) -> usize {
    let mut panicked = 0;
    for handler in handlers {
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(client, message)));
        if result.is_err() {
            panicked += 1;
            error!(command = %message.command, "handler panicked; continuing dispatch");
        }
    }
    panicked
}
