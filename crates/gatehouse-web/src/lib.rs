//! HTTP layer for Gatehouse.
//!
//! Exposes an axum [`Router`] serving the dashboard pages and the data-entry
//! API as JSON, backed by any [`DashboardStore`]. Identity comes from an
//! authenticating proxy in front of the server (see [`session`]).

pub mod actions;
pub mod auth;
pub mod config;
pub mod entries;
pub mod error;
pub mod pages;
pub mod session;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gatehouse_core::{
  guard::{Denial, Policy},
  identity::AdminSet,
  recorder::EventRecorder,
  session::SessionContext,
  store::DashboardStore,
};
use tower_http::trace::TraceLayer;

use config::ServerConfig;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: DashboardStore> {
  pub store:    Arc<S>,
  pub recorder: EventRecorder<S>,
  pub config:   Arc<ServerConfig>,
  pub admins:   Arc<AdminSet>,
}

impl<S: DashboardStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      recorder: self.recorder.clone(),
      config:   Arc::clone(&self.config),
      admins:   Arc::clone(&self.admins),
    }
  }
}

impl<S: DashboardStore> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    let admins = Arc::new(AdminSet::new(&config.auth.admin_emails));
    if admins.is_empty() {
      tracing::warn!("no admin emails configured; admin pages are unreachable");
    }
    let recorder = EventRecorder::new(Arc::clone(&store), config.monitoring.enable_analytics);

    Self { store, recorder, config: Arc::new(config), admins }
  }

  /// Map a guard denial to the matching API error.
  pub fn deny(&self, denial: Denial) -> ApiError {
    ApiError::denied(denial, &self.config.auth.login_url)
  }

  /// Check `policy` against `ctx`.
  pub fn admit(&self, policy: &Policy, ctx: &SessionContext) -> Result<(), ApiError> {
    policy.check(ctx).map_err(|d| self.deny(d))
  }

  /// Bookkeeping done on every page: track the view and refresh the stored
  /// profile of a signed-in user. Both are best-effort.
  pub(crate) async fn enter_page(&self, ctx: &SessionContext, page: &str) {
    self.recorder.track_page_view(ctx, page).await;
    self.sync_profile(ctx).await;
  }

  pub(crate) async fn sync_profile(&self, ctx: &SessionContext) {
    let Some(identity) = ctx.current_user() else { return };
    if let Err(e) = self.store.upsert_user(identity.clone()).await {
      tracing::warn!(error = %e, email = %identity.email, "failed to sync user profile");
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the Gatehouse [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DashboardStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Pages
    .route("/", get(pages::home::<S>))
    .route("/analytics", get(pages::analytics::<S>))
    .route("/settings", get(pages::settings::<S>).put(pages::update_settings::<S>))
    .route("/admin", get(pages::admin::<S>))
    .route("/admin/users/{email}/stats", get(pages::user_stats::<S>))
    .route("/admin/users/{email}/active", post(pages::set_user_active::<S>))
    // Auth
    .route("/auth/me", get(auth::me::<S>))
    .route("/auth/logout", get(auth::logout::<S>))
    // API
    .route("/api/actions", post(actions::track::<S>))
    .route("/api/entries", get(entries::list::<S>).post(entries::create::<S>))
    .route(
      "/api/entries/{id}",
      get(entries::get_one::<S>)
        .put(entries::update::<S>)
        .delete(entries::delete::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
