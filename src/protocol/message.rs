//! Protocol messages and their wire encoding.
//!
//! Each variant carries a fixed numeric identifier that leads the frame
//! payload and keys dispatch. The identifiers are part of the wire contract
//! shared by both peers and must never be renumbered.

use crate::core::buffer::{ByteBuf, ByteCursor};
use crate::error::{ProtocolError, Result};
use bytes::Bytes;

/// Stable wire identifiers, one per message variant.
pub mod id {
    pub const LOGIN: u64 = 0;
    pub const KEEP_ALIVE: u64 = 1;
    pub const SERVER_CONTROL: u64 = 2;
    pub const DISCONNECT: u64 = 3;
    pub const SCREEN_FRAME: u64 = 4;
}

/// One decoded protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Credential submission opening the handshake. The credential travels
    /// in the clear; the host only ever stores and compares its digest.
    Login { credential: String },
    /// Liveness nudge sent after a silence threshold.
    KeepAlive,
    /// Host announcement of whether the viewer may drive the controlled
    /// desktop.
    ServerControl { granted: bool },
    /// Peer-facing teardown notice with a human-readable reason.
    Disconnect { reason: String },
    /// One encoded screen update. The pixel encoding is owned by the
    /// capture pipeline and is opaque to the session engine.
    ScreenFrame { payload: Bytes },
}

impl Message {
    /// Wire identifier of this variant.
    pub fn id(&self) -> u64 {
        match self {
            Message::Login { .. } => id::LOGIN,
            Message::KeepAlive => id::KEEP_ALIVE,
            Message::ServerControl { .. } => id::SERVER_CONTROL,
            Message::Disconnect { .. } => id::DISCONNECT,
            Message::ScreenFrame { .. } => id::SCREEN_FRAME,
        }
    }

    /// Serialize this message into `buf`: leading identifier varint, then
    /// the variant fields.
    pub fn write(&self, buf: &mut ByteBuf) {
        buf.put_var_u64(self.id());
        match self {
            Message::Login { credential } => buf.put_str(credential),
            Message::KeepAlive => {}
            Message::ServerControl { granted } => buf.put_bool(*granted),
            Message::Disconnect { reason } => buf.put_str(reason),
            Message::ScreenFrame { payload } => buf.put_raw(payload),
        }
    }

    /// Encode into a fresh frame payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = ByteBuf::new();
        self.write(&mut buf);
        buf.flush()
    }

    /// Decode one frame payload.
    ///
    /// An unrecognized identifier is fatal for the session that received it;
    /// there is no way to skip an unknown variant's fields and resynchronize.
    pub fn decode(payload: Bytes) -> Result<Self> {
        let mut cursor = ByteCursor::new(payload);
        let message_id = cursor.get_var_u64()?;
        match message_id {
            id::LOGIN => Ok(Message::Login {
                credential: cursor.get_str()?,
            }),
            id::KEEP_ALIVE => Ok(Message::KeepAlive),
            id::SERVER_CONTROL => Ok(Message::ServerControl {
                granted: cursor.get_bool()?,
            }),
            id::DISCONNECT => Ok(Message::Disconnect {
                reason: cursor.get_str()?,
            }),
            id::SCREEN_FRAME => Ok(Message::ScreenFrame {
                payload: cursor.take_remaining(),
            }),
            other => Err(ProtocolError::UnknownMessageId(other)),
        }
    }
}
