//! strive-sync - client-side sync engine for the Strive productivity app
//!
//! Keeps the user's tasks, habits, goals, plans, focus sessions, and
//! rewards in an in-memory store and synchronizes them best-effort,
//! last-writer-wins, to a hosted per-user store: one hydration pass per
//! session, then debounced batch upserts after local mutations.

pub mod backend;
pub mod coach;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod prefs;
pub mod pusher;
pub mod remote;
pub mod store;

pub use backend::http::HttpBackend;
pub use backend::SyncBackend;
pub use config::Config;
pub use error::{BackendError, StoreError};
pub use orchestrator::{HydrateOutcome, PushOutcome, SyncOrchestrator, SyncStatus};
pub use remote::Collection;
pub use store::AppState;
