//! Access guards for page-rendering actions.
//!
//! A [`Policy`] decides whether a [`SessionContext`] may see a page. It can be
//! evaluated directly with [`Policy::check`], or bound to a rendering action
//! with [`Policy::wrap`] (and the [`require_auth`] / [`require_role`] /
//! [`public_page`] shorthands), which yields a [`Guarded`] action that only
//! runs when admitted.
//!
//! Guards never touch persisted state, and the decision depends only on the
//! context they are given, so calling a guarded action repeatedly with the
//! same context always produces the same admission outcome.

use std::{borrow::Cow, future::Future};

use serde::Serialize;

use crate::{identity::Role, session::SessionContext};

pub const DEFAULT_SIGN_IN_MESSAGE: &str = "You must be signed in to access this page.";
pub const DEFAULT_DENIED_MESSAGE: &str = "You do not have the permissions required for this page.";

// ─── Denials ─────────────────────────────────────────────────────────────────

/// Shown when no user is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInPrompt {
  pub message: String,
}

/// Shown when a user is signed in but lacks an allowed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forbidden {
  pub message:  String,
  pub role:     Role,
  pub required: Vec<Role>,
}

/// Why a guard refused to run its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
  SignIn(SignInPrompt),
  Forbidden(Forbidden),
}

// ─── Policy ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
  Public,
  Authenticated,
  Roles(Vec<Role>),
}

/// An admission rule plus the messages shown when it refuses.
#[derive(Debug, Clone)]
pub struct Policy {
  requirement:     Requirement,
  sign_in_message: Cow<'static, str>,
  denied_message:  Cow<'static, str>,
}

impl Policy {
  fn from_requirement(requirement: Requirement) -> Self {
    Self {
      requirement,
      sign_in_message: Cow::Borrowed(DEFAULT_SIGN_IN_MESSAGE),
      denied_message: Cow::Borrowed(DEFAULT_DENIED_MESSAGE),
    }
  }

  /// Admits everyone.
  pub fn public() -> Self { Self::from_requirement(Requirement::Public) }

  /// Admits any signed-in user.
  pub fn authenticated() -> Self { Self::from_requirement(Requirement::Authenticated) }

  /// Admits signed-in users whose role is one of `roles`.
  pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
    Self::from_requirement(Requirement::Roles(roles.into_iter().collect()))
  }

  pub fn with_sign_in_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
    self.sign_in_message = message.into();
    self
  }

  pub fn with_denied_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
    self.denied_message = message.into();
    self
  }

  /// Decide whether `ctx` is admitted.
  pub fn check(&self, ctx: &SessionContext) -> Result<(), Denial> {
    if self.requirement == Requirement::Public {
      return Ok(());
    }

    if !ctx.is_authenticated() {
      return Err(Denial::SignIn(SignInPrompt {
        message: self.sign_in_message.clone().into_owned(),
      }));
    }

    if let Requirement::Roles(allowed) = &self.requirement {
      let role = ctx.user_role();
      if !allowed.contains(&role) {
        return Err(Denial::Forbidden(Forbidden {
          message: self.denied_message.clone().into_owned(),
          role,
          required: allowed.clone(),
        }));
      }
    }

    Ok(())
  }

  /// Bind this policy to a zero-argument rendering action.
  pub fn wrap<F>(self, action: F) -> Guarded<F> { Guarded { policy: self, action } }
}

// ─── Guarded actions ─────────────────────────────────────────────────────────

/// A rendering action that only runs once its [`Policy`] admits the caller.
#[derive(Debug, Clone)]
pub struct Guarded<F> {
  policy: Policy,
  action: F,
}

impl<F> Guarded<F> {
  pub fn policy(&self) -> &Policy { &self.policy }

  /// Run the action if `ctx` is admitted.
  pub fn call<T>(&self, ctx: &SessionContext) -> Result<T, Denial>
  where
    F: Fn() -> T,
  {
    self.policy.check(ctx)?;
    Ok((self.action)())
  }

  /// Async flavour of [`call`](Self::call). The future is only created, and
  /// therefore only polled, after admission.
  pub async fn call_async<T, Fut>(&self, ctx: &SessionContext) -> Result<T, Denial>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = T>,
  {
    self.policy.check(ctx)?;
    Ok((self.action)().await)
  }
}

/// Guard `action` behind sign-in.
pub fn require_auth<F>(action: F) -> Guarded<F> { Policy::authenticated().wrap(action) }

/// Guard `action` behind sign-in and membership of one of `roles`.
pub fn require_role<F>(roles: impl IntoIterator<Item = Role>, action: F) -> Guarded<F> {
  Policy::roles(roles).wrap(action)
}

/// Mark `action` as reachable without signing in.
pub fn public_page<F>(action: F) -> Guarded<F> { Policy::public().wrap(action) }

#[cfg(test)]
mod tests {
  use std::{cell::Cell, sync::Arc};

  use super::*;
  use crate::identity::{AdminSet, Identity};

  fn admins() -> Arc<AdminSet> { Arc::new(AdminSet::new(["boss@x.com"])) }

  fn anonymous() -> SessionContext { SessionContext::anonymous(admins()) }

  fn user() -> SessionContext {
    SessionContext::signed_in(Identity::new("dev@x.com", "sub-dev"), admins())
  }

  fn admin() -> SessionContext {
    SessionContext::signed_in(Identity::new("boss@x.com", "sub-boss"), admins())
  }

  #[test]
  fn require_auth_without_identity_never_runs_action() {
    let calls   = Cell::new(0);
    let guarded = require_auth(|| calls.set(calls.get() + 1));

    for _ in 0..3 {
      let result = guarded.call(&anonymous());
      assert!(matches!(result, Err(Denial::SignIn(_))));
    }
    assert_eq!(calls.get(), 0);
  }

  #[test]
  fn require_auth_runs_action_for_signed_in_user() {
    let calls   = Cell::new(0);
    let guarded = require_auth(|| {
      calls.set(calls.get() + 1);
      "page"
    });

    assert_eq!(guarded.call(&user()), Ok("page"));
    assert_eq!(guarded.call(&user()), Ok("page"));
    assert_eq!(calls.get(), 2);
  }

  #[test]
  fn require_role_admin_with_user_role_is_forbidden() {
    let calls   = Cell::new(0);
    let guarded = require_role([Role::Admin], || calls.set(calls.get() + 1));

    match guarded.call(&user()) {
      Err(Denial::Forbidden(f)) => {
        assert_eq!(f.role, Role::User);
        assert_eq!(f.required, vec![Role::Admin]);
        assert_eq!(f.message, DEFAULT_DENIED_MESSAGE);
      }
      other => panic!("expected forbidden, got {other:?}"),
    }
    assert_eq!(calls.get(), 0);
  }

  #[test]
  fn require_role_without_identity_asks_to_sign_in() {
    let guarded = require_role([Role::Admin], || ());
    assert!(matches!(guarded.call(&anonymous()), Err(Denial::SignIn(_))));
  }

  #[test]
  fn require_role_admits_listed_role() {
    let guarded = require_role([Role::Admin, Role::User], || 42);
    assert_eq!(guarded.call(&admin()), Ok(42));
    assert_eq!(guarded.call(&user()), Ok(42));
  }

  #[test]
  fn custom_messages_are_used() {
    let policy = Policy::roles([Role::Admin])
      .with_sign_in_message("log in first")
      .with_denied_message("admins only");

    assert_eq!(
      policy.check(&anonymous()),
      Err(Denial::SignIn(SignInPrompt { message: "log in first".into() })),
    );
    match policy.check(&user()) {
      Err(Denial::Forbidden(f)) => assert_eq!(f.message, "admins only"),
      other => panic!("expected forbidden, got {other:?}"),
    }
  }

  #[test]
  fn public_page_admits_anonymous() {
    let guarded = public_page(|| "home");
    assert_eq!(guarded.call(&anonymous()), Ok("home"));
  }

  #[tokio::test]
  async fn call_async_does_not_create_future_when_denied() {
    let calls   = Cell::new(0);
    let guarded = require_auth(|| {
      calls.set(calls.get() + 1);
      async { "rendered" }
    });

    assert!(guarded.call_async(&anonymous()).await.is_err());
    assert_eq!(calls.get(), 0);
    assert_eq!(guarded.call_async(&user()).await, Ok("rendered"));
    assert_eq!(calls.get(), 1);
  }
}
