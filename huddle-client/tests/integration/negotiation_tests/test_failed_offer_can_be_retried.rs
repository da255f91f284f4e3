use std::sync::Arc;

use huddle_client::{NegotiationPhase, SessionNotice, SilentCapture, TransportEvent};

use crate::integration::{init_tracing, offer, start_test_session};
use crate::utils::{next_notice, wait_for_phase, wait_for_signal};

#[tokio::test]
async fn test_failed_offer_can_be_retried() {
    init_tracing();

    let mut t = start_test_session(Arc::new(SilentCapture), 1).await;
    let mut notices = t.handle.notices();
    let mut phase = t.handle.phase();

    t.transport.emit(TransportEvent::Offer(offer("1")));

    let notice = next_notice(&mut notices).await;
    assert!(
        matches!(notice, SessionNotice::NegotiationFailed(ref e) if e.contains("set remote offer")),
        "Unexpected notice: {:?}",
        notice
    );
    assert!(wait_for_phase(&mut phase, NegotiationPhase::Idle).await);
    assert_eq!(t.transport.count("answer").await, 0);

    // The session is still alive and a fresh offer succeeds.
    t.transport.emit(TransportEvent::Offer(offer("2")));
    wait_for_signal(&mut t.signals, "answer").await;
    assert!(wait_for_phase(&mut phase, NegotiationPhase::Connecting).await);

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
