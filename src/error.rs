//! # Error Types
//!
//! Error handling for the session engine and wire codec.
//!
//! This module defines all error variants that can occur while framing,
//! decoding, and dispatching messages, from low-level I/O failures to
//! protocol violations.
//!
//! ## Error Categories
//! - **I/O Errors**: socket read/write failures
//! - **Codec Errors**: buffer underruns, varint overflow, malformed fields
//! - **Protocol Errors**: unknown message identifiers, oversized frames
//! - **Configuration Errors**: invalid or unparsable configuration
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! Protocol-level failures never escape a session's `tick()` boundary: the
//! session resolves them locally by tearing itself down, and the only effect
//! visible to the driver is that the session stops being available.

use std::io;
use thiserror::Error;

/// Error message constants shared across the crate.
pub mod constants {
    /// Disconnect reason sent to a peer that failed authentication.
    pub const DISCONNECT_BAD_CREDENTIAL: &str = "Password error.";

    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";
}

/// Primary error type for all session and codec operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    Underrun { needed: usize, remaining: usize },

    #[error("Varint exceeds 10 bytes")]
    VarintOverflow,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unknown message identifier: {0}")]
    UnknownMessageId(u64),

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Operation timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
