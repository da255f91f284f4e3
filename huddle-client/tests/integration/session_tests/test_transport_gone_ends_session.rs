use std::sync::Arc;
use std::time::Duration;

use huddle_client::{
    CallSession, ClientConfig, ConnectionState, NegotiationPhase, ReconnectPolicy, SessionError,
    SessionNotice, SilentCapture, TransportError, TransportEvent, WsTransport,
};
use tokio::time::timeout;

use crate::integration::{init_tracing, start_test_session};
use crate::utils::{FakePeer, PeerCall, next_notice, wait_for_phase};

#[tokio::test]
async fn test_ended_transport_tears_session_down() {
    init_tracing();

    let t = start_test_session(Arc::new(SilentCapture), 0).await;
    let mut notices = t.handle.notices();
    let mut phase = t.handle.phase();

    t.transport.emit(TransportEvent::Closed);
    t.transport.emit(TransportEvent::Ended);

    assert_eq!(next_notice(&mut notices).await, SessionNotice::TransportClosed);
    assert_eq!(next_notice(&mut notices).await, SessionNotice::TransportEnded);

    let res = timeout(Duration::from_secs(5), t.task)
        .await
        .expect("Session should end with its transport")
        .expect("Session panicked");
    assert!(
        matches!(res, Err(SessionError::Transport(TransportError::Closed))),
        "Unexpected result: {:?}",
        res
    );

    assert!(t.peer.calls().contains(&PeerCall::Close));
    assert!(t.transport.is_closed());
    assert!(wait_for_phase(&mut phase, NegotiationPhase::Closed).await);
    assert!(matches!(
        t.handle.set_speaker_muted(true).await,
        Err(SessionError::Ended)
    ));
}

#[tokio::test]
async fn test_unreachable_relay_ends_session() {
    init_tracing();

    let transport = Arc::new(WsTransport::new(
        "ws://127.0.0.1:9/lobby",
        ReconnectPolicy::Never,
        16,
    ));
    let (peer, peer_handle, peer_events) = FakePeer::new(0);
    let (session, handle) = CallSession::start(
        &ClientConfig::default(),
        transport.clone(),
        Box::new(peer),
        peer_events,
        Arc::new(SilentCapture),
    )
    .expect("Failed to start session");
    let mut notices = handle.notices();

    let res = timeout(Duration::from_secs(5), session.run())
        .await
        .expect("Session should give up with the transport");
    assert!(matches!(
        res,
        Err(SessionError::Transport(TransportError::Closed))
    ));

    assert!(matches!(
        next_notice(&mut notices).await,
        SessionNotice::TransportError(_)
    ));
    assert_eq!(next_notice(&mut notices).await, SessionNotice::TransportEnded);
    assert_eq!(transport.state(), ConnectionState::Ended);
    assert_eq!(peer_handle.calls(), [PeerCall::Close]);
}
