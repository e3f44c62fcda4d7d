//! The per-request session context.
//!
//! A [`SessionContext`] is built once per request from whatever the external
//! login flow handed us and is then passed explicitly to every handler,
//! guard and recorder that needs to know who is asking. Nothing about the
//! current user lives in global state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::identity::{AdminSet, Identity, Role};

/// Identity state for a single request, plus the admin set used to derive
/// the role.
#[derive(Debug, Clone)]
pub struct SessionContext {
  identity:  Option<Identity>,
  logged_in: bool,
  admins:    Arc<AdminSet>,
  origin:    Origin,
}

/// Where a request came from, as far as the transport can tell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
  pub ip_address: Option<String>,
  pub user_agent: Option<String>,
}

impl SessionContext {
  /// A context with nobody signed in.
  pub fn anonymous(admins: Arc<AdminSet>) -> Self {
    Self { identity: None, logged_in: false, admins, origin: Origin::default() }
  }

  /// A context for an identity the login flow has vouched for.
  pub fn signed_in(identity: Identity, admins: Arc<AdminSet>) -> Self {
    Self { identity: Some(identity), logged_in: true, admins, origin: Origin::default() }
  }

  pub fn with_origin(mut self, origin: Origin) -> Self {
    self.origin = origin;
    self
  }

  pub fn origin(&self) -> &Origin { &self.origin }

  /// `true` iff an identity is present and flagged as logged in.
  pub fn is_authenticated(&self) -> bool { self.logged_in && self.identity.is_some() }

  /// Like [`is_authenticated`](Self::is_authenticated), but also rejects an
  /// identity whose provider token has expired as of `now`.
  pub fn check_auth_at(&self, now: DateTime<Utc>) -> bool {
    match self.current_user() {
      Some(identity) => !identity.is_expired_at(now),
      None => false,
    }
  }

  pub fn check_auth(&self) -> bool { self.check_auth_at(Utc::now()) }

  /// The signed-in identity, or `None` when not authenticated.
  pub fn current_user(&self) -> Option<&Identity> {
    if self.is_authenticated() { self.identity.as_ref() } else { None }
  }

  pub fn user_role(&self) -> Role {
    match self.current_user() {
      Some(identity) => self.admins.role_for(identity),
      None => Role::Anonymous,
    }
  }

  /// Email to attribute activity to; `"anonymous"` when signed out.
  pub fn actor(&self) -> &str {
    self.current_user().map_or(ANONYMOUS_ACTOR, |id| id.email.as_str())
  }

  /// Forget the identity held by this context and hand it back.
  ///
  /// The provider-side sign-out is the caller's job; this only guarantees
  /// that nothing downstream of the call still sees a user.
  pub fn logout(&mut self) -> Option<Identity> {
    self.logged_in = false;
    self.identity.take()
  }
}

pub const ANONYMOUS_ACTOR: &str = "anonymous";

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn admins() -> Arc<AdminSet> { Arc::new(AdminSet::new(["a@x.com"])) }

  #[test]
  fn admin_email_gets_admin_role() {
    let ctx = SessionContext::signed_in(Identity::new("a@x.com", "sub-a"), admins());
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.user_role(), Role::Admin);
  }

  #[test]
  fn other_email_gets_user_role() {
    let ctx = SessionContext::signed_in(Identity::new("b@x.com", "sub-b"), admins());
    assert_eq!(ctx.user_role(), Role::User);
  }

  #[test]
  fn no_identity_is_anonymous() {
    let ctx = SessionContext::anonymous(admins());
    assert!(!ctx.is_authenticated());
    assert!(ctx.current_user().is_none());
    assert_eq!(ctx.user_role(), Role::Anonymous);
    assert_eq!(ctx.actor(), ANONYMOUS_ACTOR);
  }

  #[test]
  fn missing_admin_config_never_grants_admin() {
    let ctx = SessionContext::signed_in(
      Identity::new("a@x.com", "sub-a"),
      Arc::new(AdminSet::default()),
    );
    assert_eq!(ctx.user_role(), Role::User);
  }

  #[test]
  fn logout_clears_identity() {
    let mut ctx = SessionContext::signed_in(Identity::new("a@x.com", "sub-a"), admins());
    let gone    = ctx.logout();
    assert_eq!(gone.map(|i| i.email), Some("a@x.com".to_string()));
    assert!(!ctx.is_authenticated());
    assert_eq!(ctx.user_role(), Role::Anonymous);
  }

  #[test]
  fn expired_identity_fails_check_auth_but_keeps_role() {
    let now = Utc::now();
    let id  = Identity::new("a@x.com", "sub-a").with_expiry(now - Duration::minutes(5));
    let ctx = SessionContext::signed_in(id, admins());
    assert!(ctx.is_authenticated());
    assert!(!ctx.check_auth_at(now));
    assert_eq!(ctx.user_role(), Role::Admin);
  }

  #[test]
  fn unexpired_identity_passes_check_auth() {
    let now = Utc::now();
    let id  = Identity::new("b@x.com", "sub-b").with_expiry(now + Duration::hours(1));
    let ctx = SessionContext::signed_in(id, admins());
    assert!(ctx.check_auth_at(now));
  }
}
