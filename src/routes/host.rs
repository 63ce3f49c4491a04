use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::{
        host::{ActionResponse, SelectOptionRequest, TimerRequest},
        quiz::QuizView,
        setup::QuizSetupRequest,
    },
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

const HOST_TOKEN_HEADER: &str = "x-host-token";

/// Host-only endpoints driving the quiz.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/host/setup", post(setup))
        .route("/host/start", post(start))
        .route("/host/question/reveal", post(reveal_question))
        .route("/host/option", post(select_option))
        .route("/host/pass", post(pass))
        .route("/host/correct", post(mark_correct))
        .route("/host/answer/reveal", post(reveal_answer))
        .route("/host/next", post(next_question))
        .route("/host/timer", post(timer))
        .route("/host/round/continue", post(continue_round))
        .route("/host/tie-breaker/start", post(start_tie_breaker))
        .route("/host/home", post(go_home))
        .route("/host/restart", post(restart))
        .route("/host/revert", post(revert))
        .route_layer(middleware::from_fn_with_state(state, require_host_token))
}

/// Configure a new quiz: teams, rounds and the tie-breaker bank.
#[utoipa::path(
    post,
    path = "/host/setup",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = QuizSetupRequest,
    responses(
        (status = 200, description = "Quiz configured", body = QuizView),
        (status = 400, description = "Invalid setup"),
        (status = 409, description = "A quiz is already configured")
    )
)]
pub async fn setup(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuizSetupRequest>>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::setup_quiz(&state, payload).await?))
}

/// Enter the first round.
#[utoipa::path(
    post,
    path = "/host/start",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Quiz started", body = QuizView))
)]
pub async fn start(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::start_quiz(&state).await?))
}

/// Show the active question.
#[utoipa::path(
    post,
    path = "/host/question/reveal",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Question revealed", body = QuizView))
)]
pub async fn reveal_question(
    State(state): State<SharedState>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::reveal_question(&state).await?))
}

/// Pick an option of a multiple-choice question and show the answer.
#[utoipa::path(
    post,
    path = "/host/option",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = SelectOptionRequest,
    responses((status = 200, description = "Option selected", body = QuizView))
)]
pub async fn select_option(
    State(state): State<SharedState>,
    Json(payload): Json<SelectOptionRequest>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::select_option(&state, payload.index).await?))
}

/// Pass the question on to the next team.
#[utoipa::path(
    post,
    path = "/host/pass",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Question passed on", body = QuizView))
)]
pub async fn pass(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::pass(&state).await?))
}

/// Award the active team and move on.
#[utoipa::path(
    post,
    path = "/host/correct",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Answer marked correct", body = QuizView))
)]
pub async fn mark_correct(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::mark_correct(&state).await?))
}

/// Show the answer and stop the countdown.
#[utoipa::path(
    post,
    path = "/host/answer/reveal",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Answer revealed", body = QuizView))
)]
pub async fn reveal_answer(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::reveal_answer(&state).await?))
}

/// Skip to the next question without awarding points.
#[utoipa::path(
    post,
    path = "/host/next",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Moved to the next question", body = QuizView))
)]
pub async fn next_question(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::next_question(&state).await?))
}

/// Pause, resume or toggle the countdown. An empty body toggles.
#[utoipa::path(
    post,
    path = "/host/timer",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = TimerRequest,
    responses((status = 200, description = "Countdown updated", body = QuizView))
)]
pub async fn timer(
    State(state): State<SharedState>,
    payload: Option<Json<TimerRequest>>,
) -> Result<Json<QuizView>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    Ok(Json(quiz_service::pause_play_timer(&state, request).await?))
}

/// Leave the round-complete screen.
#[utoipa::path(
    post,
    path = "/host/round/continue",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Next round, tie-breaker intro or final results", body = QuizView))
)]
pub async fn continue_round(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::continue_after_round(&state).await?))
}

/// Start the announced tie-breaker.
#[utoipa::path(
    post,
    path = "/host/tie-breaker/start",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Tie-breaker started", body = QuizView))
)]
pub async fn start_tie_breaker(
    State(state): State<SharedState>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::start_tie_breaker(&state).await?))
}

/// Leave the results screen for a fresh setup.
#[utoipa::path(
    post,
    path = "/host/home",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Back to setup", body = QuizView))
)]
pub async fn go_home(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::go_home(&state).await?))
}

/// Drop the quiz, its history and the persisted copy.
#[utoipa::path(
    post,
    path = "/host/restart",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Quiz restarted", body = ActionResponse))
)]
pub async fn restart(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(quiz_service::restart(&state).await?))
}

/// Undo the most recent host action.
#[utoipa::path(
    post,
    path = "/host/revert",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses(
        (status = 200, description = "Previous state restored", body = QuizView),
        (status = 409, description = "Nothing to revert")
    )
)]
pub async fn revert(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::revert(&state).await?))
}

async fn require_host_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(HOST_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned());
    check_host_token(&state, provided.as_deref()).await?;
    Ok(next.run(req).await)
}

async fn check_host_token(state: &SharedState, provided: Option<&str>) -> Result<(), AppError> {
    let provided = provided.ok_or_else(|| {
        AppError::Unauthorized("missing host token header `X-Host-Token`".into())
    })?;

    let expected = {
        let guard = state.host_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(()),
        Some(_) => Err(AppError::Unauthorized("invalid host token".into())),
        None => Err(AppError::Unauthorized(
            "host SSE stream not initialised yet".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn host_token_must_match_the_issued_one() {
        let state = AppState::new(AppConfig::default());
        let err = check_host_token(&state, Some("abc")).await.unwrap_err();
        assert_eq!(err.to_string(), "unauthorized: host SSE stream not initialised yet");

        state.host_token().lock().await.replace("abc".into());
        assert!(check_host_token(&state, Some("abc")).await.is_ok());
        assert!(matches!(
            check_host_token(&state, Some("xyz")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_host_token(&state, None).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
