//! Shared state for HTTP handlers.

use crate::service::ServiceHandle;

pub struct AppState {
  pub service: ServiceHandle,
}
