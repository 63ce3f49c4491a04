/// Key-value persistence backends for the quiz records.
pub mod game_store;
/// Upgrade of records written in the legacy layout.
pub mod migration;
/// Versioned record envelopes.
pub mod models;
/// Backend-independent storage errors.
pub mod storage;
