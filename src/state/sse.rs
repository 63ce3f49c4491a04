use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`AppState`](super::AppState).
pub struct SseState {
    public: SseHub,
    host: HostSseState,
}

impl SseState {
    /// Build the SSE sub-tree with per-stream channel capacities.
    pub fn new(public_capacity: usize, host_capacity: usize) -> Self {
        Self {
            public: SseHub::new(public_capacity),
            host: HostSseState::new(host_capacity),
        }
    }

    /// Hub feeding the display screens.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Host console hub and its token.
    pub fn host(&self) -> &HostSseState {
        &self.host
    }
}

/// Hub of the single host console stream plus the token it was issued.
pub struct HostSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl HostSseState {
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Broadcast hub of the host stream.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Token held by the connected host console, if any.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
