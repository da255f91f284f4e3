use crate::transport::transport_event::{GenericEvent, TransportEvent};
use huddle_core::SignalingEvent;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Decode one inbound text frame and pick its route.
///
/// `offer`, `answer` and `candidate` frames with their payload present get
/// their own variants. `error` frames are logged and go nowhere. Everything
/// else, including types this build does not know, is a [`GenericEvent`].
/// Returns `None` for frames that are dropped.
pub fn route_frame(text: &str) -> Option<TransportEvent> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Dropping malformed signaling frame: {}. Text: {}", e, text);
            return None;
        }
    };

    let Some(kind) = value.get("type").and_then(Value::as_str).map(str::to_owned) else {
        warn!("Dropping signaling frame without a type: {}", text);
        return None;
    };

    if kind == "error" {
        error!("Relay reported an error: {}", value);
        return None;
    }

    if !SignalingEvent::is_known_kind(&kind) {
        debug!("Unrecognized signaling event '{}'", kind);
        return Some(TransportEvent::Generic(GenericEvent::Unknown { kind, raw: value }));
    }

    match serde_json::from_value::<SignalingEvent>(value.clone()) {
        Ok(SignalingEvent::Offer { offer }) => Some(TransportEvent::Offer(offer)),
        Ok(SignalingEvent::Answer { answer }) => Some(TransportEvent::Answer(answer)),
        Ok(SignalingEvent::Candidate { candidate }) => Some(TransportEvent::Candidate(candidate)),
        Ok(event) => Some(TransportEvent::Generic(GenericEvent::Known(event))),
        Err(e) => {
            warn!("Signaling event '{}' did not decode: {}", kind, e);
            Some(TransportEvent::Generic(GenericEvent::Unknown { kind, raw: value }))
        }
    }
}
