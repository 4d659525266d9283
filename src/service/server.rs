//! TCP host service: accept loop and per-session drivers.
//!
//! Each accepted connection gets its own task that polls the session's
//! `tick()` on the configured interval until the session tears itself down
//! or loses its socket. The accept loop supports graceful shutdown via
//! ctrl-c or an external shutdown channel.

use crate::config::Config;
use crate::error::Result;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::handshake::HandshakePolicy;
use crate::session::{Session, SessionHooks};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Per-connection hook factory: invoked once for every accepted peer so
/// each session gets its own collaborator capabilities.
pub type HooksFactory = dyn Fn(SocketAddr) -> Box<dyn SessionHooks> + Send + Sync;

/// Start a host listening per `config`, shutting down on ctrl-c.
#[instrument(skip(config, hooks), fields(address = %config.server.address))]
pub async fn start(config: Config, hooks: Arc<HooksFactory>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            let _ = shutdown_tx_clone.send(()).await;
        }
    });

    start_with_shutdown(config, hooks, shutdown_rx).await
}

/// Start a host with an external shutdown channel.
#[instrument(skip(config, hooks, shutdown_rx), fields(address = %config.server.address))]
pub async fn start_with_shutdown(
    config: Config,
    hooks: Arc<HooksFactory>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let policy = HandshakePolicy::from_config(&config.server)?;
    let dispatcher = Arc::new(Dispatcher::host(policy)?);

    let listener = TcpListener::bind(&config.server.address).await?;
    info!(address = %config.server.address, "listening");

    // Track active sessions
    let active_sessions = Arc::new(Mutex::new(0u32));

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Shutting down host. Waiting for sessions to close...");

                let deadline = tokio::time::sleep(config.server.shutdown_timeout);
                tokio::pin!(deadline);

                loop {
                    tokio::select! {
                        _ = &mut deadline => {
                            warn!("Shutdown timeout reached, forcing exit");
                            break;
                        }
                        _ = sleep(Duration::from_millis(500)) => {
                            let sessions = *active_sessions.lock().await;
                            debug!(sessions, "Waiting for sessions to close");
                            if sessions == 0 {
                                info!("All sessions closed, shutting down");
                                break;
                            }
                        }
                    }
                }

                return Ok(());
            }

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        {
                            let mut count = active_sessions.lock().await;
                            if *count as usize >= config.server.max_connections {
                                warn!(%peer, "session limit reached, refusing connection");
                                continue;
                            }
                            *count += 1;
                        }

                        info!(%peer, "session accepted");
                        if let Err(e) = stream.set_nodelay(config.session.nodelay) {
                            warn!(error = %e, %peer, "failed to set TCP_NODELAY");
                        }

                        let session_cfg = config.session.clone();
                        let dispatcher = Arc::clone(&dispatcher);
                        let active_sessions = Arc::clone(&active_sessions);
                        let session_hooks = hooks(peer);

                        tokio::spawn(async move {
                            let mut session =
                                Session::new(stream, dispatcher, &session_cfg, session_hooks);

                            while session.is_available() && session.is_connected() {
                                session.tick().await;
                                sleep(session_cfg.poll_interval).await;
                            }
                            session.close();

                            let mut count = active_sessions.lock().await;
                            *count -= 1;
                            info!(%peer, "session ended");
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
        }
    }
}
