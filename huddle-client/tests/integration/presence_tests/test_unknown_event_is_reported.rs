use std::sync::Arc;

use huddle_client::{ProtocolError, SessionNotice, SilentCapture};
use huddle_core::SessionDescription;

use crate::integration::{init_tracing, start_test_session};
use crate::utils::{next_notice, wait_for_signal};

#[tokio::test]
async fn test_unknown_event_is_reported() {
    init_tracing();

    let mut t = start_test_session(Arc::new(SilentCapture), 0).await;
    let mut notices = t.handle.notices();

    t.transport.frame(r#"{"type":"whisper","to":"u2"}"#);
    assert_eq!(
        next_notice(&mut notices).await,
        SessionNotice::Protocol(ProtocolError::UnknownEvent {
            kind: "whisper".into()
        })
    );

    // Known type, payload missing.
    t.transport.frame(r#"{"type":"user_join"}"#);
    assert_eq!(
        next_notice(&mut notices).await,
        SessionNotice::Protocol(ProtocolError::MissingPayload {
            kind: "user_join".into()
        })
    );

    // Malformed frames and relay errors are dropped without a notice, and
    // the connection keeps working.
    t.transport.frame("{not json");
    t.transport.frame(r#"{"type":"error","message":"boom"}"#);
    t.transport.frame(&format!(
        r#"{{"type":"offer","offer":{}}}"#,
        serde_json::to_string(&SessionDescription::offer(crate::utils::sdp("8"))).unwrap()
    ));
    wait_for_signal(&mut t.signals, "answer").await;
    assert!(notices.try_recv().is_err());

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
