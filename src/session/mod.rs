//! # Session Engine
//!
//! The stateful owner of one peer connection.
//!
//! A [`Session`] holds the socket exclusively and is driven cooperatively:
//! an external driver awaits [`Session::tick`] in a loop, and each tick runs
//! one receive-and-dispatch step followed by a keep-alive check. There is no
//! internal locking — `tick()` and `send()` must never run concurrently on
//! the same session.
//!
//! ## Failure policy
//! Decode and dispatch failures surface as `Result` outcomes that are
//! matched right at the tick boundary and resolved by tearing the session
//! down; no frame resynchronization is attempted and nothing propagates to
//! the driver beyond the session becoming unavailable. Write failures close
//! the socket silently — the channel that would carry an apology is the one
//! that just broke.
//!
//! ## Blocking profile
//! The receive step starts with a non-blocking probe, but once a frame
//! length has been declared the payload accumulation holds the task until
//! the frame completes or the transport errors. A peer that declares a
//! length and withholds bytes therefore stalls this session's polling task;
//! the write path has a timeout, the read path deliberately does not.

pub mod hooks;
pub mod state;

pub use hooks::{NoHooks, SessionHooks};
pub use state::SessionState;

use crate::config::SessionConfig;
use crate::core::frame;
use crate::error::ProtocolError;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::handshake::HandshakePolicy;
use crate::protocol::message::Message;
use crate::utils::timeout::with_timeout_error;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// One per-connection session: socket, flags, activity clock, dispatcher.
pub struct Session<S> {
    io: Option<S>,
    state: SessionState,
    dispatcher: Arc<Dispatcher>,
    last_activity: Instant,
    keep_alive_interval: Duration,
    write_timeout: Duration,
    max_frame: usize,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        io: S,
        dispatcher: Arc<Dispatcher>,
        cfg: &SessionConfig,
        hooks: Box<dyn SessionHooks>,
    ) -> Self {
        Self {
            io: Some(io),
            state: SessionState::new(hooks),
            dispatcher,
            last_activity: Instant::now(),
            keep_alive_interval: cfg.keep_alive_interval,
            write_timeout: cfg.write_timeout,
            max_frame: cfg.max_frame_size,
        }
    }

    /// Session for the controlled (host) side, with the stock host table.
    pub fn host(
        io: S,
        cfg: &SessionConfig,
        policy: HandshakePolicy,
        hooks: Box<dyn SessionHooks>,
    ) -> crate::error::Result<Self> {
        Ok(Self::new(io, Arc::new(Dispatcher::host(policy)?), cfg, hooks))
    }

    /// Session for the viewing side, with the stock viewer table.
    pub fn viewer(
        io: S,
        cfg: &SessionConfig,
        hooks: Box<dyn SessionHooks>,
    ) -> crate::error::Result<Self> {
        Ok(Self::new(io, Arc::new(Dispatcher::viewer()?), cfg, hooks))
    }

    /// Whether the session still owns a usable socket.
    pub fn is_connected(&self) -> bool {
        self.io.is_some()
    }

    /// True from construction until teardown.
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn server_control_granted(&self) -> bool {
        self.state.server_control_granted()
    }

    /// Time since the last successful receive or send.
    pub fn time_since_last_activity(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Run one update cycle: receive-and-dispatch, then keep-alive.
    pub async fn tick(&mut self) {
        self.receive_step().await;
        self.keep_alive_check().await;
    }

    /// Non-blocking probe for a pending frame; on the first byte, commit to
    /// reading and dispatching the whole frame.
    async fn receive_step(&mut self) {
        let Some(io) = self.io.as_mut() else {
            return;
        };

        let first = match timeout(Duration::ZERO, io.read_u8()).await {
            // nothing buffered on the socket this tick
            Err(_elapsed) => return,
            // read failure is "nothing to do yet": a dead peer is only
            // discovered when a write fails
            Ok(Err(_)) => return,
            Ok(Ok(byte)) => byte,
        };

        // bytes on the wire count as activity even if the payload turns out
        // to be malformed
        self.last_activity = Instant::now();

        let outcome = self.read_and_dispatch(first).await;
        self.flush_outbox().await;

        match outcome {
            Ok(()) => {
                if let Some(notify) = self.state.take_close_request() {
                    self.disconnect(notify);
                    self.close();
                }
            }
            Err(error) => {
                warn!(%error, "fatal session error, tearing down");
                self.disconnect(true);
                self.close();
            }
        }
    }

    async fn read_and_dispatch(&mut self, first: u8) -> crate::error::Result<()> {
        let max_frame = self.max_frame;
        let io = self.io.as_mut().ok_or(ProtocolError::ConnectionClosed)?;

        let payload = frame::read_frame_after(first, io, max_frame).await?;
        let message = Message::decode(payload)?;
        debug!(id = message.id(), "dispatching frame");
        self.dispatcher.dispatch(&mut self.state, &message)
    }

    /// Send every message queued by handlers during dispatch.
    async fn flush_outbox(&mut self) {
        while let Some(message) = self.state.pop_outbound() {
            self.send(&message).await;
        }
    }

    /// Liveness nudge: after a quiet interval, send one keep-alive.
    ///
    /// The threshold only ever triggers sending, never closing — peer
    /// silence does not end a session here.
    async fn keep_alive_check(&mut self) {
        if self.last_activity.elapsed() < self.keep_alive_interval {
            return;
        }
        self.send(&Message::KeepAlive).await;
    }

    /// Encode and write one message, fire-and-forget.
    ///
    /// A session whose socket is gone ignores the call. A write failure or
    /// timeout closes the socket on the spot; the caller is not told, and
    /// the peer cannot be.
    #[instrument(skip(self, message), level = "debug", fields(id = message.id()))]
    pub async fn send(&mut self, message: &Message) {
        let write_timeout = self.write_timeout;
        let Some(io) = self.io.as_mut() else {
            return;
        };

        let payload = message.encode();
        let written = with_timeout_error(frame::write_frame(io, &payload), write_timeout).await;
        match written {
            Ok(()) => self.last_activity = Instant::now(),
            Err(error) => {
                warn!(%error, "write failed, closing socket");
                self.io = None;
            }
        }
    }

    /// Mark the session unavailable; fire the disconnect hook when the
    /// teardown is peer-initiated.
    pub fn disconnect(&mut self, notify: bool) {
        self.state.mark_unavailable();
        if notify {
            self.state.hooks_mut().on_peer_disconnect(None);
        }
    }

    /// Release the socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.io = None;
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connected", &self.io.is_some())
            .field("state", &self.state)
            .finish()
    }
}
