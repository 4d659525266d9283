//! # remote-session
//!
//! Per-connection session engine and wire protocol core for remote desktop
//! services.
//!
//! Each accepted connection is owned by exactly one [`Session`]: it frames
//! messages on the wire, drives the credential handshake, keeps the
//! connection alive, and dispatches decoded messages to handlers. Sessions
//! are poll-driven — a driver loop awaits [`Session::tick`] — and resolve
//! every protocol failure locally by tearing themselves down.
//!
//! ## Layers
//! - [`core`]: byte buffers, varint encoding, frame I/O
//! - [`protocol`]: messages, dispatch, credential handshake
//! - [`session`]: the per-connection engine
//! - [`service`]: TCP accept loop and viewer connector
//! - [`config`] / [`utils`]: configuration, logging, timeouts
//!
//! ## Wire Format
//! ```text
//! [varint payload_len] [varint message_id] [variant fields]
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use remote_session::config::Config;
//! use remote_session::protocol::handshake::SecretDigest;
//! use remote_session::session::NoHooks;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> remote_session::Result<()> {
//!     let config = Config::default_with_overrides(|cfg| {
//!         cfg.server.secret_hash = SecretDigest::of("sesame").to_hex();
//!         cfg.server.allow_remote_control = true;
//!     });
//!     config.validate_strict()?;
//!
//!     remote_session::utils::logging::init(&config.logging)?;
//!     remote_session::service::server::start(
//!         config,
//!         Arc::new(|_peer| Box::new(NoHooks) as _),
//!     )
//!     .await
//! }
//! ```

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod session;
pub mod utils;

pub use config::Config;
pub use error::{ProtocolError, Result};
pub use protocol::handshake::{HandshakePolicy, SecretDigest};
pub use protocol::message::Message;
pub use session::{NoHooks, Session, SessionHooks, SessionState};
