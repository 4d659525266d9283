//! Credential handshake elevating a session to authenticated.
//!
//! The configured secret is a pre-computed SHA-256 digest; the submitted
//! credential is hashed and compared, so the clear-text secret never lives
//! in host memory. Policy and secret are passed in explicitly at
//! construction — there is no process-wide singleton — which also makes the
//! handshake unit-testable with arbitrary secrets.

use crate::config::ServerConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::Message;
use crate::session::state::SessionState;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::{info, warn};

/// SHA-256 digest of a session credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretDigest([u8; 32]);

impl SecretDigest {
    /// Digest a clear-text credential.
    pub fn of(credential: &str) -> Self {
        Self(Sha256::digest(credential.as_bytes()).into())
    }

    /// Parse a digest from its 64-character hex form, as stored in
    /// configuration.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != 64 {
            return Err(ProtocolError::ConfigError(format!(
                "secret digest must be 64 hex characters, got {}",
                hex.len()
            )));
        }

        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let hi = hex_nibble(chunk[0])?;
            let lo = hex_nibble(chunk[1])?;
            out[i] = (hi << 4) | lo;
        }
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
    }

    /// Whether `credential` hashes to this digest.
    pub fn matches(&self, credential: &str) -> bool {
        Self::of(credential).0 == self.0
    }
}

impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // digests identify the secret; keep them out of logs
        f.write_str("SecretDigest(..)")
    }
}

fn hex_nibble(byte: u8) -> Result<u8> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        other => Err(ProtocolError::ConfigError(format!(
            "invalid hex character in secret digest: {:?}",
            other as char
        ))),
    }
}

/// Host-side authentication policy: the configured secret plus whether
/// authenticated peers may drive the controlled desktop.
#[derive(Debug, Clone)]
pub struct HandshakePolicy {
    secret: SecretDigest,
    allow_control: bool,
}

impl HandshakePolicy {
    pub fn new(secret: SecretDigest, allow_control: bool) -> Self {
        Self {
            secret,
            allow_control,
        }
    }

    pub fn from_config(cfg: &ServerConfig) -> Result<Self> {
        Ok(Self::new(
            SecretDigest::from_hex(&cfg.secret_hash)?,
            cfg.allow_remote_control,
        ))
    }

    /// Validate a submitted credential and transition the session.
    ///
    /// On a match the session becomes authenticated, the screen-delivery
    /// hook fires, and a [`Message::ServerControl`] announcement is queued.
    /// On a mismatch the peer is sent an explicit disconnect notice and the
    /// session is asked to tear down; the notice reaches the wire before
    /// the socket closes because queued messages are flushed first.
    pub fn authenticate(&self, state: &mut SessionState, credential: &str) {
        if self.secret.matches(credential) {
            info!("session authenticated");
            state.set_authenticated(true);
            state.hooks_mut().on_authenticated();
            state.queue(Message::ServerControl {
                granted: self.allow_control,
            });
        } else {
            warn!("rejecting session: credential mismatch");
            state.queue(Message::Disconnect {
                reason: constants::DISCONNECT_BAD_CREDENTIAL.to_string(),
            });
            state.request_close(true);
        }
    }
}
