//! Per-session SSE event stream
//!
//! A connection becomes the session's sole event subscriber for its
//! lifetime. Connecting again for the same session takes the
//! registration over; the older stream goes quiet and ends. Dropping
//! the stream (including abnormal disconnects) releases the binding.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::AppState;

/// GET /sessions/{session_id}/events
pub async fn session_event_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(session_id = %session_id, "SSE client connected");

    let mut subscription = state.channel.clone().register(session_id.clone());

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                // Heartbeat comments keep intermediaries from closing
                // an otherwise-quiet stream
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    yield Ok(Event::default().comment("heartbeat"));
                }

                event = subscription.recv() => {
                    match event {
                        Some(event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!(event_type, "SSE event delivered");
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!(event_type, error = %e, "SSE event serialization failed");
                                }
                            }
                        }
                        // Replaced by a newer subscriber for this session
                        None => break,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
