use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{HostHandshake, ServerEvent},
    error::ServiceError,
    state::{SharedState, SseHub},
};

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the host console stream, claiming its token.
pub async fn subscribe_host(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_host_token(state).await?;
    let receiver = state.host_sse().subscribe();
    Ok((receiver, token))
}

/// Identifies the target SSE stream so we can perform stream-specific
/// bookkeeping when the connection is torn down.
#[derive(Clone)]
pub enum StreamKind {
    Public,
    /// Carries the shared state so teardown can release the host token.
    Host(SharedState),
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // The next quiz.state event carries the full state again.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => tracing::info!("Public SSE stream disconnected"),
            StreamKind::Host(state) => {
                release_host_token(state).await;
                tracing::info!("Host SSE stream disconnected")
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Reserve the host token for a new stream, failing if another console holds it.
async fn claim_host_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.host_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "Another host console is already connected".into(),
        )),
    }
}

/// Send the freshly issued token on the host stream.
pub fn broadcast_host_handshake(hub: &SseHub, token: &str) {
    if let Ok(event) = ServerEvent::json(
        Some("host_token".to_string()),
        &HostHandshake {
            token: token.to_string(),
        },
    ) {
        hub.broadcast(event);
    }
}

/// Send a human-readable info message onto the public SSE stream.
pub fn broadcast_public_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

/// Clear the host token so the next console negotiates a fresh one.
async fn release_host_token(state: SharedState) {
    let mut guard = state.host_token().lock().await;
    guard.take();
}
