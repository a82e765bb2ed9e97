//! EcoHub Notification Correlation Engine (deterministic, rule-based).
//!
//! Turns zone-scoped bus alerts into notifications, deduplicates repeats, and tracks
//! each suggested remedial command from suggestion to completion. Manual device
//! actions and asynchronous completion signals are reconciled against the same list.
//!
//! No network; reducers are pure and dispatch is handed back to the caller as an effect.

pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod persistence;
pub mod severity;
pub mod store;
pub mod types;

pub use config::Config;
pub use engine::{Applied, Engine, StoreObserver};
pub use error::{EngineError, StoreError};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceAdapter};
pub use types::{Action, ActionState, Decision, Effect, Notification, Severity};
