use serde::Serialize;
use utoipa::ToSchema;

use crate::state::clock::TimerState;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Plain-text event.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Token issued to the host console when its stream opens.
pub struct HostHandshake {
    /// Value to send back in the `x-host-token` header.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per second while the countdown runs.
pub struct TimerTickEvent {
    pub time_left: u32,
    pub running: bool,
    pub pass_mode: bool,
    /// Countdown reached zero before the answer was shown.
    pub time_up: bool,
}

impl TimerTickEvent {
    /// Event for `timer` as it stands after a tick.
    pub fn new(timer: &TimerState, time_up: bool) -> Self {
        Self {
            time_left: timer.time_left.unwrap_or_default(),
            running: timer.running,
            pass_mode: timer.pass_mode,
            time_up,
        }
    }
}
