use huddle_client::{NegotiationPhase, PresenceState, SessionNotice};
use huddle_core::SignalingEvent;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// Next outbound signal, failing the test if none arrives.
pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<SignalingEvent>) -> SignalingEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("Timed out waiting for a signal")
        .expect("Signal channel closed")
}

/// Skip signals until one of `kind` arrives.
pub async fn wait_for_signal(
    rx: &mut mpsc::UnboundedReceiver<SignalingEvent>,
    kind: &str,
) -> SignalingEvent {
    loop {
        let signal = next_signal(rx).await;
        if signal.kind() == kind {
            return signal;
        }
    }
}

/// Assert that nothing else is sent within a short grace period.
pub async fn assert_no_signal(rx: &mut mpsc::UnboundedReceiver<SignalingEvent>) {
    if let Ok(Some(signal)) = timeout(Duration::from_millis(200), rx.recv()).await {
        panic!("Unexpected signal: {:?}", signal);
    }
}

pub async fn wait_for_phase(
    rx: &mut watch::Receiver<NegotiationPhase>,
    phase: NegotiationPhase,
) -> bool {
    timeout(WAIT, rx.wait_for(|p| *p == phase))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false)
}

pub async fn wait_for_presence(
    rx: &mut watch::Receiver<PresenceState>,
    f: impl FnMut(&PresenceState) -> bool,
) -> PresenceState {
    timeout(WAIT, rx.wait_for(f))
        .await
        .expect("Timed out waiting for presence")
        .expect("Presence store dropped")
        .clone()
}

pub async fn next_notice(rx: &mut broadcast::Receiver<SessionNotice>) -> SessionNotice {
    timeout(WAIT, rx.recv())
        .await
        .expect("Timed out waiting for a notice")
        .expect("Notice bus closed")
}
