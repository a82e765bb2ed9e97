//! HTTP handlers for the notification service.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use notification_engine::correlation::Outcome;
use notification_engine::Notification;
use std::sync::Arc;
use tracing::error;

use crate::service::Reply;
use crate::state::AppState;
use crate::types::{ActionResponse, DecisionPayload, ManualActionPayload};

pub async fn health() -> &'static str {
  "ok"
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Notification>>, StatusCode> {
  match state.service.snapshot().await {
    Ok(items) => Ok(Json(items)),
    Err(e) => {
      error!(error = %e, "list: service unavailable");
      Err(StatusCode::SERVICE_UNAVAILABLE)
    }
  }
}

pub async fn decide(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(payload): Json<DecisionPayload>,
) -> (StatusCode, Json<ActionResponse>) {
  match state.service.decide(id, payload.decision).await {
    Ok(reply) => respond(reply),
    Err(e) => {
      error!(error = %e, "decide: service unavailable");
      unavailable()
    }
  }
}

pub async fn manual_action(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<ManualActionPayload>,
) -> (StatusCode, Json<ActionResponse>) {
  if payload.zone_id.trim().is_empty() || payload.command.trim().is_empty() {
    return (
      StatusCode::BAD_REQUEST,
      Json(ActionResponse {
        notification: None,
        ignored: Some("zoneId and command are required".into()),
      }),
    );
  }
  match state
    .service
    .track_manual_action(payload.zone_id, payload.command, payload.action_text)
    .await
  {
    Ok(reply) => respond(reply),
    Err(e) => {
      error!(error = %e, "manual action: service unavailable");
      unavailable()
    }
  }
}

pub async fn clear(State(state): State<Arc<AppState>>) -> StatusCode {
  match state.service.clear_all().await {
    Ok(()) => StatusCode::NO_CONTENT,
    Err(e) => {
      error!(error = %e, "clear: service unavailable");
      StatusCode::SERVICE_UNAVAILABLE
    }
  }
}

fn respond(reply: Reply) -> (StatusCode, Json<ActionResponse>) {
  let status = match (&reply.outcome, &reply.notification) {
    (_, None) => StatusCode::NOT_FOUND,
    (Outcome::Ignored { .. }, Some(_)) => StatusCode::CONFLICT,
    _ => StatusCode::ACCEPTED,
  };
  let ignored = match reply.outcome {
    Outcome::Ignored { reason } => Some(reason.to_string()),
    _ => None,
  };
  (
    status,
    Json(ActionResponse {
      notification: reply.notification,
      ignored,
    }),
  )
}

fn unavailable() -> (StatusCode, Json<ActionResponse>) {
  (
    StatusCode::SERVICE_UNAVAILABLE,
    Json(ActionResponse {
      notification: None,
      ignored: None,
    }),
  )
}
