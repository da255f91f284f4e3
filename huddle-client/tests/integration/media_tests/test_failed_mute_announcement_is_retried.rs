use std::sync::Arc;

use huddle_client::{SessionError, SignalingTransport, SilentCapture, TransportError};
use huddle_core::{SignalingEvent, User};

use crate::integration::{init_tracing, start_test_session};
use crate::utils::{assert_no_signal, next_signal, wait_for_presence};

#[tokio::test]
async fn test_failed_mute_announcement_is_retried() {
    init_tracing();

    let mut t = start_test_session(Arc::new(SilentCapture), 0).await;
    let mut presence = t.handle.presence();

    t.transport
        .frame(r#"{"type":"user","user":{"id":"me","emoji":"🐸"}}"#);
    wait_for_presence(&mut presence, |p| p.self_user.is_some()).await;
    t.handle
        .request_microphone()
        .await
        .expect("Microphone should be granted");

    t.transport.close().await;
    let res = t.handle.set_microphone_muted(false).await;
    assert!(
        matches!(res, Err(SessionError::Transport(TransportError::Closed))),
        "Unexpected result: {:?}",
        res
    );
    assert!(
        t.handle.presence().borrow().is_muted_microphone,
        "Unannounced unmute must not be committed"
    );

    // The retry after the relay is back is announced.
    t.transport.reopen();
    assert_eq!(next_signal(&mut t.signals).await, SignalingEvent::RequestOffer);
    t.handle.set_microphone_muted(false).await.expect("Unmute failed");
    assert_eq!(
        next_signal(&mut t.signals).await,
        SignalingEvent::Unmute {
            user: User::new("me", "🐸")
        }
    );
    assert!(!t.handle.presence().borrow().is_muted_microphone);
    assert_no_signal(&mut t.signals).await;

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
