use std::time::Duration;

use huddle_client::{
    ConnectionState, ReconnectPolicy, SignalingTransport, TransportEvent, WsTransport,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

async fn wait_for(rx: &mut broadcast::Receiver<TransportEvent>, event: TransportEvent) {
    timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(e) if e == event => return,
                Ok(_) => continue,
                Err(e) => panic!("Transport bus failed: {e}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("Timed out waiting for {:?}", event));
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    init_tracing();

    let relay = TestRelay::spawn(true).await;
    let policy = ReconnectPolicy::Fixed {
        max_attempts: 3,
        delay: Duration::from_millis(50),
    };
    let transport = WsTransport::new(format!("{}/lobby", relay.base_url()), policy, 16);
    let mut events = transport.subscribe();
    transport.connect();

    wait_for(&mut events, TransportEvent::Open).await;
    wait_for(&mut events, TransportEvent::Closed).await;
    wait_for(&mut events, TransportEvent::Open).await;
    assert_eq!(relay.connections(), 2);

    transport.close().await;
}

#[tokio::test]
async fn test_never_policy_stays_closed() {
    init_tracing();

    let relay = TestRelay::spawn(true).await;
    let transport = WsTransport::new(
        format!("{}/lobby", relay.base_url()),
        ReconnectPolicy::Never,
        16,
    );
    let mut events = transport.subscribe();
    transport.connect();

    wait_for(&mut events, TransportEvent::Open).await;
    wait_for(&mut events, TransportEvent::Closed).await;
    wait_for(&mut events, TransportEvent::Ended).await;
    assert_eq!(transport.state(), ConnectionState::Ended);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(relay.connections(), 1);

    transport.close().await;
}

#[tokio::test]
async fn test_unreachable_relay_reports_error() {
    init_tracing();

    let transport = WsTransport::new("ws://127.0.0.1:9/lobby", ReconnectPolicy::Never, 16);
    let mut events = transport.subscribe();
    transport.connect();

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("Timed out")
        .expect("Transport bus closed");
    assert!(matches!(event, TransportEvent::Error(_)), "Got {:?}", event);

    // Never opened, so no `Closed`; the end is still announced.
    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("Timed out")
        .expect("Transport bus closed");
    assert_eq!(event, TransportEvent::Ended);
    assert_eq!(transport.state(), ConnectionState::Ended);

    transport.close().await;
}

#[tokio::test]
async fn test_retries_run_out() {
    init_tracing();

    let policy = ReconnectPolicy::Fixed {
        max_attempts: 2,
        delay: Duration::from_millis(20),
    };
    let transport = WsTransport::new("ws://127.0.0.1:9/lobby", policy, 16);
    let mut events = transport.subscribe();
    transport.connect();

    let errors = timeout(Duration::from_secs(5), async {
        let mut errors = 0;
        loop {
            match events.recv().await {
                Ok(TransportEvent::Error(_)) => errors += 1,
                Ok(TransportEvent::Ended) => return errors,
                Ok(other) => panic!("Unexpected event {:?}", other),
                Err(e) => panic!("Transport bus failed: {e}"),
            }
        }
    })
    .await
    .expect("Transport never gave up");

    // The first try plus two retries.
    assert_eq!(errors, 3);
    assert_eq!(transport.state(), ConnectionState::Ended);
    transport.close().await;
}

#[tokio::test]
async fn test_close_does_not_announce_end() {
    init_tracing();

    let relay = TestRelay::spawn(false).await;
    let transport = WsTransport::new(
        format!("{}/lobby", relay.base_url()),
        ReconnectPolicy::Never,
        16,
    );
    let mut events = transport.subscribe();
    transport.connect();
    wait_for(&mut events, TransportEvent::Open).await;

    transport.close().await;
    wait_for(&mut events, TransportEvent::Closed).await;
    assert_eq!(transport.state(), ConnectionState::Disconnected);
    while let Ok(event) = events.try_recv() {
        assert_ne!(event, TransportEvent::Ended);
    }
}
