//! # Protocol Layer
//!
//! Messages, identifier-keyed dispatch, and the credential handshake.
//!
//! ## Components
//! - **Message**: tagged union of the five protocol units, each knowing its
//!   own wire encoding
//! - **Dispatcher**: identifier → handler table consulted by the session's
//!   receive loop
//! - **Handshake**: digest comparison elevating a session to authenticated

pub mod dispatcher;
pub mod handshake;
pub mod message;
