//! Handlers for `/api/entries` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/entries` | The caller's entries, newest first |
//! | `POST`   | `/api/entries` | Body: [`NewDataEntry`]; returns 201 |
//! | `GET`    | `/api/entries/:id` | 404 unless owned by the caller |
//! | `PUT`    | `/api/entries/:id` | Body: [`EntryPatch`] |
//! | `DELETE` | `/api/entries/:id` | 204 on success |
//!
//! All endpoints require a signed-in user. Entries belonging to someone else
//! are reported as missing rather than forbidden.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use gatehouse_core::{
  activity::Details,
  entry::{DataEntry, EntryPatch, NewDataEntry},
  guard::Policy,
  session::SessionContext,
  store::DashboardStore,
};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Session};

/// Admit `ctx` and return the email entries are scoped to.
fn owner<'c, S>(state: &AppState<S>, ctx: &'c SessionContext) -> Result<&'c str, ApiError>
where
  S: DashboardStore,
{
  state.admit(&Policy::authenticated(), ctx)?;
  Ok(ctx.actor())
}

async fn owned_entry<S>(state: &AppState<S>, id: Uuid, owner: &str) -> Result<DataEntry, ApiError>
where
  S: DashboardStore,
{
  state
    .store
    .get_entry(id)
    .await
    .map_err(ApiError::store)?
    .filter(|e| e.owner_email == owner)
    .ok_or_else(|| ApiError::NotFound(format!("entry {id} not found")))
}

fn entry_details(id: Uuid) -> Details {
  let mut details = Details::new();
  details.insert("entry_id".into(), json!(id));
  details
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/entries`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<Vec<DataEntry>>, ApiError>
where
  S: DashboardStore + 'static,
{
  let owner   = owner(&state, &ctx)?;
  let entries = state.store.list_entries(owner).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /api/entries`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<NewDataEntry>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore + 'static,
{
  let owner = owner(&state, &ctx)?;
  body.validate()?;

  let entry = state
    .store
    .create_entry(owner, body)
    .await
    .map_err(ApiError::store)?;

  state
    .recorder
    .track_action(&ctx, "create_entry", Some(entry_details(entry.id)), None)
    .await;

  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/entries/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<Uuid>,
) -> Result<Json<DataEntry>, ApiError>
where
  S: DashboardStore + 'static,
{
  let owner = owner(&state, &ctx)?;
  Ok(Json(owned_entry(&state, id, owner).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /api/entries/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<Uuid>,
  Json(patch): Json<EntryPatch>,
) -> Result<Json<DataEntry>, ApiError>
where
  S: DashboardStore + 'static,
{
  let owner = owner(&state, &ctx)?;
  patch.validate()?;
  owned_entry(&state, id, owner).await?;

  let entry = state
    .store
    .update_entry(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("entry {id} not found")))?;

  state
    .recorder
    .track_action(&ctx, "update_entry", Some(entry_details(id)), None)
    .await;

  Ok(Json(entry))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/entries/:id`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DashboardStore + 'static,
{
  let owner = owner(&state, &ctx)?;
  owned_entry(&state, id, owner).await?;

  if !state.store.delete_entry(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("entry {id} not found")));
  }

  state
    .recorder
    .track_action(&ctx, "delete_entry", Some(entry_details(id)), None)
    .await;

  Ok(StatusCode::NO_CONTENT)
}
