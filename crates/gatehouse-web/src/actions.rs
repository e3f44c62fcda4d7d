//! `POST /api/actions`: let the client report an action worth tracking
//! (button clicks, exports, form submissions).

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use gatehouse_core::{activity::Details, store::DashboardStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, session::Session};

#[derive(Debug, Deserialize)]
pub struct ActionBody {
  pub action:  String,
  pub page:    Option<String>,
  pub details: Option<Details>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Tracked {
  /// `false` when analytics is disabled or the write failed.
  pub recorded: bool,
}

pub async fn track<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<ActionBody>,
) -> Result<(StatusCode, Json<Tracked>), ApiError>
where
  S: DashboardStore + 'static,
{
  let action = body.action.trim();
  if action.is_empty() {
    return Err(ApiError::BadRequest("action must not be empty".into()));
  }

  let record = state
    .recorder
    .track_action(&ctx, action, body.details, body.page.as_deref())
    .await;

  Ok((StatusCode::ACCEPTED, Json(Tracked { recorded: record.is_some() })))
}
