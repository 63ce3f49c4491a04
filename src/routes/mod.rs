use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod health;
pub mod host;
pub mod quiz;
pub mod sse;

/// Compose the quiz API with the Swagger UI at `/docs`.
pub fn router(state: SharedState) -> Router<()> {
    let swagger: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    health::router()
        .merge(quiz::router())
        .merge(sse::router())
        .merge(host::router(state.clone()))
        .merge(swagger)
        .with_state(state)
}
