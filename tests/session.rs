//! Behavioral tests for the session engine: handshake, keep-alive,
//! teardown, and send-path failure handling over in-memory transports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use bytes::Bytes;
use remote_session::config::SessionConfig;
use remote_session::core::buffer::ByteBuf;
use remote_session::core::frame;
use remote_session::protocol::handshake::{HandshakePolicy, SecretDigest};
use remote_session::protocol::message::Message;
use remote_session::session::{NoHooks, Session, SessionHooks};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::time::{sleep, timeout};

#[derive(Clone, Default)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingHooks {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionHooks for RecordingHooks {
    fn on_authenticated(&mut self) {
        self.events.lock().unwrap().push("authenticated".into());
    }

    fn on_screen_frame(&mut self, payload: &Bytes) {
        self.events
            .lock()
            .unwrap()
            .push(format!("frame:{}", payload.len()));
    }

    fn on_peer_disconnect(&mut self, reason: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("closed:{}", reason.unwrap_or("-")));
    }
}

fn test_policy(allow_control: bool) -> HandshakePolicy {
    HandshakePolicy::new(SecretDigest::of("sesame"), allow_control)
}

fn host_session(
    io: DuplexStream,
    cfg: &SessionConfig,
    allow_control: bool,
) -> Session<DuplexStream> {
    Session::host(io, cfg, test_policy(allow_control), Box::new(NoHooks)).unwrap()
}

async fn write_message(io: &mut (impl tokio::io::AsyncWrite + Unpin), msg: &Message) {
    frame::write_frame(io, &msg.encode()).await.unwrap();
}

async fn read_message(io: &mut (impl tokio::io::AsyncRead + Unpin)) -> Message {
    let payload = frame::read_frame(io, 1 << 20).await.unwrap();
    Message::decode(payload).unwrap()
}

async fn assert_no_pending_frame(io: &mut (impl tokio::io::AsyncRead + Unpin)) {
    let probe = timeout(Duration::from_millis(20), frame::read_frame(io, 1 << 20)).await;
    assert!(probe.is_err(), "expected no pending frame");
}

// ============================================================================
// HANDSHAKE
// ============================================================================

#[tokio::test]
async fn test_valid_credential_authenticates_and_announces_control() {
    let cfg = SessionConfig::default();
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, true);

    write_message(&mut viewer_io, &Message::Login {
        credential: "sesame".into(),
    })
    .await;

    session.tick().await;

    assert!(session.is_authenticated());
    assert!(session.is_available());
    assert_eq!(
        read_message(&mut viewer_io).await,
        Message::ServerControl { granted: true }
    );
}

#[tokio::test]
async fn test_bad_credential_sends_disconnect_then_tears_down() {
    let cfg = SessionConfig::default();
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, false);

    write_message(&mut viewer_io, &Message::Login {
        credential: "wrong".into(),
    })
    .await;

    session.tick().await;

    assert!(!session.is_authenticated());
    assert!(!session.is_available());
    assert!(!session.is_connected());

    // the disconnect notice is the last thing on the wire before EOF
    assert_eq!(
        read_message(&mut viewer_io).await,
        Message::Disconnect {
            reason: "Password error.".into()
        }
    );
    let after = frame::read_frame(&mut viewer_io, 1 << 20).await;
    assert!(after.is_err(), "socket should be closed after the notice");
}

// ============================================================================
// RECEIVE LOOP
// ============================================================================

#[tokio::test]
async fn test_frame_spread_over_tiny_chunks_is_reassembled() {
    let cfg = SessionConfig::default();
    // a 2-byte duplex buffer forces the frame across many partial reads
    let (mut viewer_io, host_io) = tokio::io::duplex(2);
    let mut session = host_session(host_io, &cfg, true);

    let writer = tokio::spawn(async move {
        write_message(&mut viewer_io, &Message::Login {
            credential: "sesame".into(),
        })
        .await;
        viewer_io
    });

    // let the writer queue its first bytes, then tick until dispatch
    sleep(Duration::from_millis(10)).await;
    for _ in 0..100 {
        session.tick().await;
        if session.is_authenticated() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert!(session.is_authenticated());
    writer.await.unwrap();
}

#[tokio::test]
async fn test_unknown_identifier_tears_session_down() {
    let cfg = SessionConfig::default();
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, false);

    let mut payload = ByteBuf::new();
    payload.put_var_u64(99);
    frame::write_frame(&mut viewer_io, &payload.flush())
        .await
        .unwrap();

    session.tick().await;

    assert!(!session.is_available());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn test_truncated_payload_tears_session_down() {
    let cfg = SessionConfig::default();
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, false);

    // Login frame whose string field declares more bytes than the frame holds
    let mut payload = ByteBuf::new();
    payload.put_var_u64(0); // Login id
    payload.put_var_u64(50); // declares 50 credential bytes
    payload.put_raw(b"short");
    frame::write_frame(&mut viewer_io, &payload.flush())
        .await
        .unwrap();

    session.tick().await;

    assert!(!session.is_available());
}

#[tokio::test]
async fn test_quiet_socket_leaves_session_untouched() {
    let cfg = SessionConfig::default();
    let (_viewer_io, host_io) = tokio::io::duplex(64);
    let mut session = host_session(host_io, &cfg, false);

    session.tick().await;

    assert!(session.is_available());
    assert!(session.is_connected());
    assert!(!session.is_authenticated());
}

// ============================================================================
// KEEP-ALIVE
// ============================================================================

#[tokio::test]
async fn test_keep_alive_after_silence_threshold() {
    let cfg = SessionConfig {
        keep_alive_interval: Duration::from_millis(30),
        ..SessionConfig::default()
    };
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, false);

    // fresh session: activity clock just started, nothing to nudge
    session.tick().await;
    assert_no_pending_frame(&mut viewer_io).await;

    sleep(Duration::from_millis(40)).await;
    session.tick().await;
    assert_eq!(read_message(&mut viewer_io).await, Message::KeepAlive);

    // the send refreshed the clock; an immediate tick stays quiet
    session.tick().await;
    assert_no_pending_frame(&mut viewer_io).await;
}

#[tokio::test]
async fn test_inbound_activity_suppresses_keep_alive() {
    let cfg = SessionConfig {
        keep_alive_interval: Duration::from_millis(200),
        ..SessionConfig::default()
    };
    let (mut viewer_io, host_io) = tokio::io::duplex(4096);
    let mut session = host_session(host_io, &cfg, false);

    sleep(Duration::from_millis(120)).await;
    write_message(&mut viewer_io, &Message::KeepAlive).await;
    session.tick().await; // receives the peer's nudge, clock refreshed

    sleep(Duration::from_millis(120)).await;
    session.tick().await; // 120ms since last activity: below threshold

    assert_no_pending_frame(&mut viewer_io).await;
}

// ============================================================================
// SEND PATH
// ============================================================================

#[tokio::test]
async fn test_send_on_closed_session_is_a_quiet_no_op() {
    let cfg = SessionConfig::default();
    let (_viewer_io, host_io) = tokio::io::duplex(64);
    let mut session = host_session(host_io, &cfg, false);

    session.close();
    session.send(&Message::KeepAlive).await;

    assert!(!session.is_connected());
    // close is idempotent
    session.close();
}

#[tokio::test]
async fn test_write_failure_closes_socket_silently() {
    let cfg = SessionConfig::default();
    let (viewer_io, host_io) = tokio::io::duplex(64);
    let mut session = host_session(host_io, &cfg, false);

    drop(viewer_io);
    session
        .send(&Message::Disconnect {
            reason: "going away".into(),
        })
        .await;

    assert!(!session.is_connected());
    // the failed write does not by itself mark the session unavailable
    assert!(session.is_available());
}

#[tokio::test]
async fn test_wedged_peer_hits_write_timeout() {
    let cfg = SessionConfig {
        write_timeout: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    // a 1-byte buffer nobody drains wedges the second write
    let (_viewer_io, host_io) = tokio::io::duplex(1);
    let mut session = host_session(host_io, &cfg, false);

    session
        .send(&Message::ScreenFrame {
            payload: Bytes::from(vec![0u8; 128]),
        })
        .await;

    assert!(!session.is_connected());
}

// ============================================================================
// END TO END
// ============================================================================

#[tokio::test]
async fn test_host_viewer_pair_full_handshake() {
    let cfg = SessionConfig::default();
    let (host_io, viewer_io) = tokio::io::duplex(4096);
    let hooks = RecordingHooks::default();

    let mut host = host_session(host_io, &cfg, true);
    let mut viewer = Session::viewer(viewer_io, &cfg, Box::new(hooks.clone())).unwrap();

    viewer
        .send(&Message::Login {
            credential: "sesame".into(),
        })
        .await;

    for _ in 0..50 {
        host.tick().await;
        viewer.tick().await;
        if viewer.server_control_granted() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert!(host.is_authenticated());
    assert!(viewer.server_control_granted());
}

#[tokio::test]
async fn test_rejected_viewer_sees_reason_and_closes() {
    let cfg = SessionConfig::default();
    let (host_io, viewer_io) = tokio::io::duplex(4096);
    let hooks = RecordingHooks::default();

    let mut host = host_session(host_io, &cfg, false);
    let mut viewer = Session::viewer(viewer_io, &cfg, Box::new(hooks.clone())).unwrap();

    viewer
        .send(&Message::Login {
            credential: "wrong".into(),
        })
        .await;

    for _ in 0..50 {
        host.tick().await;
        viewer.tick().await;
        if !viewer.is_available() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert!(!host.is_available());
    assert!(!viewer.is_available());
    assert_eq!(hooks.events(), vec!["closed:Password error.".to_string()]);
}

#[tokio::test]
async fn test_screen_frames_reach_viewer_hooks() {
    let cfg = SessionConfig::default();
    let (mut host_io, viewer_io) = tokio::io::duplex(4096);
    let hooks = RecordingHooks::default();
    let mut viewer = Session::viewer(viewer_io, &cfg, Box::new(hooks.clone())).unwrap();

    write_message(&mut host_io, &Message::ScreenFrame {
        payload: Bytes::from(vec![7u8; 640]),
    })
    .await;
    viewer.tick().await;

    assert_eq!(hooks.events(), vec!["frame:640".to_string()]);
    assert!(viewer.is_available());
}
