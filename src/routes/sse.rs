use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{
        public_service,
        sse_events::broadcast_public_quiz_state,
        sse_service::{self, StreamKind},
    },
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Display SSE stream (`quiz.state`, `timer.tick`)", content_type = "text/event-stream", body = String))
)]
/// Stream quiz updates to the display screens.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("New public SSE connection");
    sse_service::broadcast_public_info(state.public_sse(), "public stream connected");
    let view = public_service::quiz_view(&state).await;
    broadcast_public_quiz_state(&state, &view);
    sse_service::to_sse_stream(receiver, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/host",
    tag = "sse",
    responses(
        (status = 200, description = "Host SSE stream; the first event carries the host token", content_type = "text/event-stream", body = String),
        (status = 401, description = "Another host console is connected")
    )
)]
/// Stream host events, issuing the token required by the `/host` routes.
pub async fn host_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, token) = sse_service::subscribe_host(&state).await?;
    info!("New host SSE connection");
    sse_service::broadcast_host_handshake(state.host_sse(), &token);
    Ok(sse_service::to_sse_stream(receiver, StreamKind::Host(state)))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/host", get(host_stream))
}
