//! EcoHub Notification Service
//!
//! Hosts the notification correlation engine: bus feed in, command dispatch out,
//! background persistence through the engine's observer hook, and a small HTTP surface for the UI.
//! Bind to 127.0.0.1 by default (internal only).

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod error;
mod handlers;
pub mod service;
mod state;
pub mod types;
pub mod writer;

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::cors::CorsLayer;

pub use config::ServiceConfig;
pub use dispatch::{CommandDispatcher, HttpDispatcher};
pub use error::{ConfigError, DispatchError, ServiceError};
pub use handlers::{clear, decide, health, list, manual_action};
pub use service::{Reply, Service, ServiceHandle};
pub use state::AppState;
pub use writer::PersistenceWriter;

/// Routes for the UI layer.
pub fn router(service: ServiceHandle) -> Router {
  let state = Arc::new(AppState { service });
  Router::new()
    .route("/health", get(health))
    .route("/notifications", get(list).delete(clear))
    .route("/notifications/:id/decision", post(decide))
    .route("/manual-actions", post(manual_action))
    .layer(CorsLayer::permissive())
    .with_state(state)
}
