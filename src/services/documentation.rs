use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Neon Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::quiz::current_quiz,
        crate::routes::sse::public_stream,
        crate::routes::sse::host_stream,
        crate::routes::host::setup,
        crate::routes::host::start,
        crate::routes::host::reveal_question,
        crate::routes::host::select_option,
        crate::routes::host::pass,
        crate::routes::host::mark_correct,
        crate::routes::host::reveal_answer,
        crate::routes::host::next_question,
        crate::routes::host::timer,
        crate::routes::host::continue_round,
        crate::routes::host::start_tie_breaker,
        crate::routes::host::go_home,
        crate::routes::host::restart,
        crate::routes::host::revert,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleQuizPhase,
            crate::dto::quiz::QuizView,
            crate::dto::quiz::TeamScore,
            crate::dto::quiz::LeaderboardEntry,
            crate::dto::quiz::RoundView,
            crate::dto::quiz::QuestionView,
            crate::dto::quiz::TimerView,
            crate::dto::quiz::FlagsView,
            crate::dto::quiz::HistorySummary,
            crate::dto::setup::QuizSetupRequest,
            crate::dto::setup::RoundInput,
            crate::dto::setup::QuestionInput,
            crate::dto::setup::TieBreakerInput,
            crate::dto::host::SelectOptionRequest,
            crate::dto::host::TimerRequest,
            crate::dto::host::TimerModeInput,
            crate::dto::host::ActionResponse,
            crate::dto::sse::HostHandshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::TimerTickEvent,
            crate::state::game::MediaKind,
            crate::state::game::RoundKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quiz", description = "Read-only quiz projection"),
        (name = "host", description = "Host console actions; require the token issued on /sse/host"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_host_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/healthcheck",
            "/quiz",
            "/sse/public",
            "/sse/host",
            "/host/setup",
            "/host/timer",
            "/host/tie-breaker/start",
            "/host/revert",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(paths.keys().filter(|p| p.starts_with("/host/")).count(), 14);
    }
}
