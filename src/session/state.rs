//! Per-connection state shared with message handlers.
//!
//! Handlers run inline on the session's polling task and receive `&mut
//! SessionState`: they may read and flip flags, enqueue outbound messages,
//! and request teardown, but socket I/O stays with the session itself.

use crate::protocol::message::Message;
use crate::session::hooks::SessionHooks;
use std::collections::VecDeque;

/// Mutable session state visible to dispatch handlers.
pub struct SessionState {
    available: bool,
    authenticated: bool,
    server_control: bool,
    outbox: VecDeque<Message>,
    close_request: Option<bool>,
    hooks: Box<dyn SessionHooks>,
}

impl SessionState {
    pub(crate) fn new(hooks: Box<dyn SessionHooks>) -> Self {
        Self {
            available: true,
            authenticated: false,
            server_control: false,
            outbox: VecDeque::new(),
            close_request: None,
            hooks,
        }
    }

    /// True from construction until teardown.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// True once the handshake accepted the peer's credential.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the host granted this peer remote control.
    pub fn server_control_granted(&self) -> bool {
        self.server_control
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn set_server_control(&mut self, granted: bool) {
        self.server_control = granted;
    }

    /// Enqueue a message for the session to send after dispatch returns.
    pub fn queue(&mut self, message: Message) {
        self.outbox.push_back(message);
    }

    /// Ask the session to tear down once queued messages have been flushed.
    ///
    /// `notify` controls whether the disconnect callback fires; handlers
    /// that already informed the hooks themselves pass `false`.
    pub fn request_close(&mut self, notify: bool) {
        // first request wins; a later, quieter request must not downgrade it
        if self.close_request.is_none() {
            self.close_request = Some(notify);
        }
    }

    pub fn hooks_mut(&mut self) -> &mut dyn SessionHooks {
        &mut *self.hooks
    }

    pub(crate) fn pop_outbound(&mut self) -> Option<Message> {
        self.outbox.pop_front()
    }

    pub(crate) fn take_close_request(&mut self) -> Option<bool> {
        self.close_request.take()
    }

    pub(crate) fn mark_unavailable(&mut self) {
        self.available = false;
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("available", &self.available)
            .field("authenticated", &self.authenticated)
            .field("server_control", &self.server_control)
            .field("queued", &self.outbox.len())
            .finish()
    }
}
