//! Timeout wrappers and the crate's shared duration constants.

use crate::error::{ProtocolError, Result};
use std::future::Future;
use std::time::Duration;

/// Deadline for one outbound write. Kept short so a wedged peer is
/// discovered quickly instead of stalling the polling task.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Silence threshold after which a session nudges its peer.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_millis(100);

/// How long a shutting-down server waits for sessions to drain.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between driver ticks of one session.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Deadline for an outbound connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Await `future` under a deadline, mapping expiry onto
/// [`ProtocolError::Timeout`].
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}
