//! Identity endpoints.
//!
//! Sign-in itself happens at the proxy; these endpoints only report and end
//! what the proxy established.

use axum::{
  Json,
  extract::State,
  response::Redirect,
};
use gatehouse_core::{
  identity::{Identity, Role},
  store::DashboardStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, session::Session};

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmI {
  pub authenticated: bool,
  /// `false` when the provider token has expired.
  pub token_valid:   bool,
  pub role:          Role,
  pub user:          Option<Identity>,
  pub login_url:     String,
}

/// `GET /auth/me`
pub async fn me<S>(State(state): State<AppState<S>>, Session(ctx): Session) -> Json<WhoAmI>
where
  S: DashboardStore + 'static,
{
  Json(WhoAmI {
    authenticated: ctx.is_authenticated(),
    token_valid:   ctx.check_auth(),
    role:          ctx.user_role(),
    user:          ctx.current_user().cloned(),
    login_url:     state.config.auth.login_url.clone(),
  })
}

/// `GET /auth/logout`: forget the user and hand over to the provider's
/// sign-out endpoint.
pub async fn logout<S>(State(state): State<AppState<S>>, Session(mut ctx): Session) -> Redirect
where
  S: DashboardStore + 'static,
{
  if ctx.is_authenticated() {
    state.recorder.track_action(&ctx, "logout", None, None).await;
  }
  if let Some(identity) = ctx.logout() {
    tracing::info!(email = %identity.email, "signed out");
  }
  Redirect::to(&state.config.auth.logout_url)
}
