//! Injected collaborator capabilities.
//!
//! The session core has no dependency on any presentation framework or
//! capture pipeline; everything it needs from the outside world arrives
//! through this trait. The references are non-owning notifications, never
//! ownership of a window or a capture thread.

use bytes::Bytes;

/// Callbacks a session fires toward its external collaborators.
///
/// Every method has a no-op default, so embedders implement only what they
/// consume.
pub trait SessionHooks: Send {
    /// The peer presented a valid credential. On a host this is the signal
    /// to start streaming screen frames to the session.
    fn on_authenticated(&mut self) {}

    /// One opaque screen update arrived (viewer side).
    fn on_screen_frame(&mut self, _payload: &Bytes) {}

    /// The session is going away. `reason` carries the peer's disconnect
    /// notice when the peer initiated the teardown; local shutdown skips
    /// this callback entirely so an embedding UI is not churned twice.
    fn on_peer_disconnect(&mut self, _reason: Option<&str>) {}
}

/// Hook implementation for sessions with no attached collaborators.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SessionHooks for NoHooks {}
