//! # Core Codec Components
//!
//! Low-level byte buffers, varint encoding, and frame I/O.
//!
//! This module is the foundation for all message serialization: the write
//! buffer and cursor readers live in [`buffer`], and the length-prefixed
//! framing over the live transport lives in [`frame`].
//!
//! ## Wire Format
//! ```text
//! [varint payload_len] [payload]
//!     payload = [varint message_id] [variant fields]
//! ```
//!
//! ## Safeguards
//! - Declared frame lengths are validated against the configured maximum
//!   before the payload buffer is allocated
//! - Decode reads never grow the buffer; running past the declared bounds
//!   is an underrun error

pub mod buffer;
pub mod frame;
