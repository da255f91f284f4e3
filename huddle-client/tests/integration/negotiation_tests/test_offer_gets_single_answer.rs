use std::sync::Arc;

use huddle_client::{NegotiationPhase, SilentCapture, TransportEvent};

use crate::integration::{init_tracing, offer, start_test_session};
use crate::utils::wait_for_phase;

#[tokio::test]
async fn test_offer_gets_single_answer() {
    init_tracing();

    let t = start_test_session(Arc::new(SilentCapture), 0).await;
    let mut phase = t.handle.phase();

    t.transport.emit(TransportEvent::Offer(offer("4242")));

    assert!(
        wait_for_phase(&mut phase, NegotiationPhase::Connecting).await,
        "Negotiation should reach Connecting"
    );
    assert_eq!(t.transport.count("answer").await, 1, "Exactly one answer per offer");

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
