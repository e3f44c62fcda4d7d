//! Dashboard pages.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | `GET`  | `/` | public |
//! | `GET`  | `/analytics` | signed in |
//! | `GET`  | `/settings` | signed in |
//! | `PUT`  | `/settings` | signed in; body `{"preferences":{...}}` |
//! | `GET`  | `/admin` | admin |
//! | `GET`  | `/admin/users/:email/stats` | admin |
//! | `POST` | `/admin/users/:email/active` | admin; body `{"active":false}` |
//!
//! Every page tracks its view before the guard runs, so refused visits are
//! counted too.

use axum::{
  Json,
  extract::{Path, State},
};
use gatehouse_core::{
  activity::{ActivityRecord, AppStats, Details, UserStats},
  guard::{Policy, public_page, require_auth},
  identity::{Identity, Role, normalize_email},
  profile::UserProfile,
  store::DashboardStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, session::Session};

pub const ADMIN_DENIED_MESSAGE: &str = "This page is reserved for administrators.";

/// Rows of recent activity shown on the admin page.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

fn admin_policy() -> Policy {
  Policy::roles([Role::Admin]).with_denied_message(ADMIN_DENIED_MESSAGE)
}

// ─── Home ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HomePage {
  pub app_name: String,
  pub role:     Role,
  pub user:     Option<Identity>,
}

/// `GET /`
pub async fn home<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<HomePage>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.enter_page(&ctx, "home").await;

  let page = public_page(|| HomePage {
    app_name: state.config.app_name.clone(),
    role:     ctx.user_role(),
    user:     ctx.current_user().cloned(),
  })
  .call(&ctx)
  .map_err(|d| state.deny(d))?;

  Ok(Json(page))
}

// ─── Analytics ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsPage {
  pub email: String,
  pub stats: UserStats,
}

/// `GET /analytics`: the caller's own activity summary.
pub async fn analytics<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<AnalyticsPage>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.enter_page(&ctx, "analytics").await;

  let stats = require_auth(|| state.recorder.user_stats(ctx.actor()))
    .call_async(&ctx)
    .await
    .map_err(|d| state.deny(d))?
    .map_err(ApiError::store)?;

  Ok(Json(AnalyticsPage { email: ctx.actor().to_owned(), stats }))
}

// ─── Settings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsPage {
  pub user:    Identity,
  pub role:    Role,
  pub profile: Option<UserProfile>,
}

/// `GET /settings`
pub async fn settings<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<SettingsPage>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.enter_page(&ctx, "settings").await;

  let profile = require_auth(|| state.store.get_user(ctx.actor()))
    .call_async(&ctx)
    .await
    .map_err(|d| state.deny(d))?
    .map_err(ApiError::store)?;

  let user = ctx
    .current_user()
    .cloned()
    .ok_or_else(|| ApiError::NotFound("no signed-in user".into()))?;

  Ok(Json(SettingsPage { user, role: ctx.user_role(), profile }))
}

#[derive(Debug, Deserialize)]
pub struct SettingsBody {
  pub preferences: Value,
}

/// `PUT /settings`: replace the caller's preferences.
pub async fn update_settings<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<SettingsBody>,
) -> Result<Json<UserProfile>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.admit(&Policy::authenticated(), &ctx)?;

  if !body.preferences.is_object() {
    return Err(ApiError::BadRequest("preferences must be a JSON object".into()));
  }

  state.sync_profile(&ctx).await;
  let profile = state
    .store
    .set_preferences(ctx.actor(), body.preferences)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no profile for {}", ctx.actor())))?;

  state
    .recorder
    .track_action(&ctx, "update_preferences", None, Some("settings"))
    .await;

  Ok(Json(profile))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminPage {
  pub stats:           AppStats,
  /// Percentage of known users with any recorded activity.
  pub engagement_rate: f64,
  pub admin_count:     usize,
  pub recent_activity: Vec<ActivityRecord>,
  pub users:           Vec<UserProfile>,
}

/// `GET /admin`
pub async fn admin<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<AdminPage>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.enter_page(&ctx, "admin").await;

  let page = admin_policy()
    .wrap(|| load_admin_page(&state))
    .call_async(&ctx)
    .await
    .map_err(|d| state.deny(d))??;

  Ok(Json(page))
}

async fn load_admin_page<S>(state: &AppState<S>) -> Result<AdminPage, ApiError>
where
  S: DashboardStore,
{
  let stats = state.recorder.app_stats().await.map_err(ApiError::store)?;
  let recent_activity = state
    .store
    .recent_activity(RECENT_ACTIVITY_LIMIT)
    .await
    .map_err(ApiError::store)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;

  Ok(AdminPage {
    engagement_rate: stats.engagement_rate(),
    stats,
    admin_count: state.admins.len(),
    recent_activity,
    users,
  })
}

/// `GET /admin/users/:email/stats`: any user's activity summary.
pub async fn user_stats<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(email): Path<String>,
) -> Result<Json<AnalyticsPage>, ApiError>
where
  S: DashboardStore + 'static,
{
  let email = normalize_email(&email);
  let stats = admin_policy()
    .wrap(|| state.recorder.user_stats(&email))
    .call_async(&ctx)
    .await
    .map_err(|d| state.deny(d))?
    .map_err(ApiError::store)?;

  Ok(Json(AnalyticsPage { email, stats }))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `POST /admin/users/:email/active`
///
/// The flag is informational: it is shown on the admin page but does not
/// gate access, which is decided by the proxy and the admin set alone.
pub async fn set_user_active<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(email): Path<String>,
  Json(body): Json<ActiveBody>,
) -> Result<Json<UserProfile>, ApiError>
where
  S: DashboardStore + 'static,
{
  state.admit(&admin_policy(), &ctx)?;
  let email = normalize_email(&email);

  let profile = state
    .store
    .set_user_active(&email, body.active)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no profile for {email}")))?;

  let mut details = Details::new();
  details.insert("email".into(), json!(email));
  details.insert("active".into(), json!(body.active));
  state
    .recorder
    .track_action(&ctx, "set_user_active", Some(details), Some("admin"))
    .await;

  Ok(Json(profile))
}
