use std::sync::Arc;

use huddle_client::SilentCapture;

use crate::integration::{init_tracing, start_test_session};
use crate::utils::wait_for_presence;

fn join(id: &str) -> String {
    format!(r#"{{"type":"user_join","user":{{"id":"{id}","emoji":"🐱"}}}}"#)
}

fn leave(id: &str) -> String {
    format!(r#"{{"type":"user_leave","user":{{"id":"{id}","emoji":"🐱"}}}}"#)
}

#[tokio::test]
async fn test_join_leave_order() {
    init_tracing();

    let t = start_test_session(Arc::new(SilentCapture), 0).await;
    let mut presence = t.handle.presence();

    for frame in [
        join("a"),
        join("b"),
        join("c"),
        leave("b"),
        join("a"),
        leave("nobody"),
        join("d"),
    ] {
        t.transport.frame(&frame);
    }

    let state = wait_for_presence(&mut presence, |p| p.room.len() == 3).await;
    let ids: Vec<_> = state.room.users.iter().map(|u| u.id.0.as_str()).collect();
    assert_eq!(ids, ["a", "c", "d"]);

    t.handle.shutdown().await;
    t.task.await.expect("Session panicked").expect("Session failed");
}
