/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Read-only quiz projection for the display.
pub mod public_service;
/// Host console actions driving the quiz.
pub mod quiz_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor and degraded mode tracking.
pub mod storage_supervisor;
