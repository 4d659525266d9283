//! # Service Layer
//!
//! Ready-made drivers around the session engine.
//!
//! The engine itself is transport-agnostic and poll-driven; this module
//! supplies the two concrete TCP entry points:
//! - **server**: accept loop with graceful shutdown that drives one host
//!   session per connection
//! - **client**: viewer connector that opens the socket and submits the
//!   credential

pub mod client;
pub mod server;
