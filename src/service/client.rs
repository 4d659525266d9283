//! Viewer-side connector.
//!
//! Opens the TCP connection, applies the socket options, and submits the
//! credential. The returned session is then driven by the caller's own
//! `tick()` loop, exactly like a host-side session.

use crate::config::Config;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::Message;
use crate::session::{Session, SessionHooks};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, instrument};

/// Connect to a host and submit `password` as the session credential.
///
/// The credential travels in the clear; securing the transport is out of
/// scope for this engine. A host that rejects the credential answers with
/// a `Disconnect` notice, which the stock viewer dispatcher resolves into
/// session teardown on a subsequent `tick()`.
#[instrument(skip(config, password, hooks), fields(address = %config.client.address))]
pub async fn connect(
    config: &Config,
    password: &str,
    hooks: Box<dyn SessionHooks>,
) -> Result<Session<TcpStream>> {
    let stream = timeout(
        config.client.connection_timeout,
        TcpStream::connect(&config.client.address),
    )
    .await
    .map_err(|_| ProtocolError::Timeout)??;

    stream.set_nodelay(config.session.nodelay)?;
    info!("connected");

    let mut session = Session::viewer(stream, &config.session, hooks)?;
    session
        .send(&Message::Login {
            credential: password.to_string(),
        })
        .await;

    // a failed login write already closed the socket
    if !session.is_connected() {
        return Err(ProtocolError::ConnectionClosed);
    }

    Ok(session)
}
