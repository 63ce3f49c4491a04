use crate::{dto::quiz::QuizView, state::SharedState};

/// Current quiz projection.
pub async fn quiz_view(state: &SharedState) -> QuizView {
    let engine = state.engine().lock().await;
    QuizView::from_engine(&engine)
}
