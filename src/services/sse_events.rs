use serde::Serialize;
use tracing::{info, warn};

use crate::{
    dto::{
        quiz::QuizView,
        sse::{ServerEvent, SystemStatus, TimerTickEvent},
    },
    state::SharedState,
};

const EVENT_QUIZ_STATE: &str = "quiz.state";
const EVENT_TIMER_TICK: &str = "timer.tick";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the full quiz projection to every stream.
pub fn broadcast_quiz_state(state: &SharedState, view: &QuizView) {
    send_public_event(state, EVENT_QUIZ_STATE, view);
    send_host_event(state, EVENT_QUIZ_STATE, view);
}

/// Send the current quiz projection to the display stream only.
pub fn broadcast_public_quiz_state(state: &SharedState, view: &QuizView) {
    send_public_event(state, EVENT_QUIZ_STATE, view);
}

/// Broadcast a countdown tick to every stream.
pub fn broadcast_timer_tick(state: &SharedState, tick: &TimerTickEvent) {
    send_public_event(state, EVENT_TIMER_TICK, tick);
    send_host_event(state, EVENT_TIMER_TICK, tick);
}

/// Broadcast a change of degraded mode to the host console.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_host_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Forward degraded-mode changes to the host stream until the state is dropped.
pub async fn forward_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        info!(degraded, "storage availability changed");
        broadcast_system_status(&state, degraded);
    }
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_host_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.host_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::{AppState, clock::TimerState}};

    #[tokio::test]
    async fn ticks_reach_both_streams() {
        let state = AppState::new(AppConfig::default());
        let mut public = state.public_sse().subscribe();
        let mut host = state.host_sse().subscribe();

        let timer = TimerState::stopped_at(12);
        broadcast_timer_tick(&state, &TimerTickEvent::new(&timer, false));

        for receiver in [&mut public, &mut host] {
            let event = receiver.recv().await.unwrap();
            assert_eq!(event.event.as_deref(), Some(EVENT_TIMER_TICK));
            assert!(event.data.contains("\"time_left\":12"));
        }
    }

    #[tokio::test]
    async fn system_status_is_host_only() {
        let state = AppState::new(AppConfig::default());
        let mut public = state.public_sse().subscribe();
        let mut host = state.host_sse().subscribe();

        broadcast_system_status(&state, true);
        let event = host.recv().await.unwrap();
        assert_eq!(event.data, "{\"degraded\":true}");
        assert!(public.try_recv().is_err());
    }
}
