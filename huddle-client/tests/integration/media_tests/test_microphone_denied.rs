use std::sync::Arc;

use huddle_client::{DeniedCapture, MediaError, PermissionError, SessionError, TransportEvent};

use crate::integration::{init_tracing, offer, start_test_session};
use crate::utils::{assert_no_signal, wait_for_signal};

#[tokio::test]
async fn test_microphone_denied() {
    init_tracing();

    let mut t = start_test_session(Arc::new(DeniedCapture), 0).await;

    let res = t.handle.request_microphone().await;
    assert!(
        matches!(
            res,
            Err(SessionError::Media(MediaError::Permission(PermissionError::Denied)))
        ),
        "Unexpected result: {:?}",
        res
    );

    let res = t.handle.set_microphone_muted(true).await;
    assert!(
        matches!(res, Err(SessionError::Media(MediaError::NotConnected))),
        "Unexpected result: {:?}",
        res
    );
    assert_no_signal(&mut t.signals).await;

    // The call itself is unaffected.
    t.transport.emit(TransportEvent::Offer(offer("12")));
    wait_for_signal(&mut t.signals, "answer").await;

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
