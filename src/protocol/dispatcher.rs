use crate::error::{constants, ProtocolError, Result};
use crate::protocol::handshake::HandshakePolicy;
use crate::protocol::message::{id, Message};
use crate::session::state::SessionState;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, trace};

type HandlerFn = dyn Fn(&mut SessionState, &Message) -> Result<()> + Send + Sync + 'static;

/// Message dispatcher routing decoded frames by wire identifier.
///
/// The table is populated once when a session is constructed and is
/// read-only afterwards; dispatch is a lookup-and-invoke over the numeric
/// tag. A known identifier with no registered handler is treated the same
/// as an unknown identifier: fatal for the session that received it.
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<u64, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stock table for the controlled (host) side of a connection.
    pub fn host(policy: HandshakePolicy) -> Result<Self> {
        let dispatcher = Self::new();

        dispatcher.register(id::LOGIN, move |state, msg| {
            if let Message::Login { credential } = msg {
                policy.authenticate(state, credential);
            }
            Ok(())
        })?;
        dispatcher.register(id::KEEP_ALIVE, keep_alive)?;
        dispatcher.register(id::DISCONNECT, peer_disconnect)?;

        Ok(dispatcher)
    }

    /// Stock table for the viewing side of a connection.
    pub fn viewer() -> Result<Self> {
        let dispatcher = Self::new();

        dispatcher.register(id::KEEP_ALIVE, keep_alive)?;
        dispatcher.register(id::SERVER_CONTROL, |state, msg| {
            if let Message::ServerControl { granted } = msg {
                info!(granted = *granted, "host announced control policy");
                state.set_server_control(*granted);
            }
            Ok(())
        })?;
        dispatcher.register(id::DISCONNECT, peer_disconnect)?;
        dispatcher.register(id::SCREEN_FRAME, |state, msg| {
            if let Message::ScreenFrame { payload } = msg {
                state.hooks_mut().on_screen_frame(payload);
            }
            Ok(())
        })?;

        Ok(dispatcher)
    }

    pub fn register<F>(&self, message_id: u64, handler: F) -> Result<()>
    where
        F: Fn(&mut SessionState, &Message) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        handlers.insert(message_id, Box::new(handler));
        Ok(())
    }

    pub fn dispatch(&self, state: &mut SessionState, msg: &Message) -> Result<()> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;

        handlers
            .get(&msg.id())
            .ok_or(ProtocolError::UnknownMessageId(msg.id()))
            .and_then(|handler| handler(state, msg))
    }
}

fn keep_alive(_state: &mut SessionState, _msg: &Message) -> Result<()> {
    // arrival already refreshed the activity clock; nothing else to do
    trace!("keep-alive from peer");
    Ok(())
}

fn peer_disconnect(state: &mut SessionState, msg: &Message) -> Result<()> {
    if let Message::Disconnect { reason } = msg {
        debug!(%reason, "peer requested disconnect");
        state.hooks_mut().on_peer_disconnect(Some(reason));
        // the hook has been informed; the teardown itself stays quiet
        state.request_close(false);
    }
    Ok(())
}
