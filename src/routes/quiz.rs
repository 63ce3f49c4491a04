use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::quiz::QuizView, services::public_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/quiz",
    tag = "quiz",
    responses((status = 200, description = "Current quiz projection", body = QuizView))
)]
/// Read-only view of the running quiz.
pub async fn current_quiz(State(state): State<SharedState>) -> Json<QuizView> {
    Json(public_service::quiz_view(&state).await)
}

/// Configure the public quiz routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/quiz", get(current_quiz))
}
