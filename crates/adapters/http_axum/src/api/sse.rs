//! Server-Sent Events (SSE) stream of resource change events.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

use homerc_app::{Subscriber, WaitOutcome};
use homerc_domain::id::SubscriberId;

use crate::error::ApiError;
use crate::state::AppState;

const BUFFER: usize = 64;
const POLL: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
pub struct StreamQuery {
    pub pattern: Option<String>,
}

/// `GET /api/events/stream[?pattern=…]` — SSE stream of change events.
///
/// Registers a subscriber on the directory, interested in the given
/// comma-separated patterns (every resource by default), and forwards each
/// event as a JSON `data:` frame. The subscriber is dropped once the client
/// disconnects or the directory shuts down.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscriber = state
        .directory
        .subscribe(&format!("sse-{}", SubscriberId::new()))?;
    subscriber.add_pattern(query.pattern.as_deref().unwrap_or("*"))?;

    let (tx, rx) = mpsc::channel(BUFFER);
    tokio::spawn(forward(subscriber, tx));

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

async fn forward(subscriber: Subscriber, tx: mpsc::Sender<Result<Event, Infallible>>) {
    while !tx.is_closed() {
        match subscriber.wait_event(Some(POLL)).await {
            WaitOutcome::Event(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    if tx.send(Ok(Event::default().data(json))).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to serialize change event for SSE stream");
                }
            },
            WaitOutcome::TimedOut | WaitOutcome::Interrupted => {}
            WaitOutcome::Closed => break,
        }
    }
    tracing::debug!(subscriber = subscriber.name(), "SSE stream ended");
}
