//! Identity, role and admin-set types.
//!
//! An [`Identity`] is what the external login flow tells us about the person
//! behind a request. It is never persisted as a source of truth; the role is
//! recomputed from the configured [`AdminSet`] every time it is asked for.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub email:          String,
  pub name:           Option<String>,
  pub picture:        Option<String>,
  /// Provider-issued subject identifier, unique per account.
  pub subject:        String,
  #[serde(default)]
  pub email_verified: bool,
  /// When the provider's token stops being valid, if it told us.
  pub expires_at:     Option<DateTime<Utc>>,
}

impl Identity {
  /// Minimal identity with only the required fields set.
  pub fn new(email: impl Into<String>, subject: impl Into<String>) -> Self {
    Self {
      email:          email.into(),
      name:           None,
      picture:        None,
      subject:        subject.into(),
      email_verified: false,
      expires_at:     None,
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
    self.expires_at = Some(at);
    self
  }

  /// `true` if the provider supplied an expiry that is not after `now`.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|exp| exp <= now)
  }

  /// The name to greet the user with: display name, else the email.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.email)
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  User,
  Anonymous,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::User => "user",
      Self::Anonymous => "anonymous",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Self::Admin),
      "user" => Ok(Self::User),
      "anonymous" => Ok(Self::Anonymous),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

// ─── Admin set ───────────────────────────────────────────────────────────────

/// Email addresses granted the [`Role::Admin`] role.
///
/// Addresses are compared trimmed and lowercased. The default set is empty,
/// so a deployment without admin configuration has no admins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSet {
  emails: BTreeSet<String>,
}

impl AdminSet {
  pub fn new<I, E>(emails: I) -> Self
  where
    I: IntoIterator<Item = E>,
    E: AsRef<str>,
  {
    let emails = emails
      .into_iter()
      .map(|e| normalize_email(e.as_ref()))
      .filter(|e| !e.is_empty())
      .collect();
    Self { emails }
  }

  pub fn contains(&self, email: &str) -> bool {
    self.emails.contains(&normalize_email(email))
  }

  pub fn is_empty(&self) -> bool { self.emails.is_empty() }

  pub fn len(&self) -> usize { self.emails.len() }

  /// Role for an authenticated identity. Never returns `Anonymous`.
  pub fn role_for(&self, identity: &Identity) -> Role {
    if self.contains(&identity.email) { Role::Admin } else { Role::User }
  }
}

/// The canonical form of an email address: trimmed and lowercased. Every
/// email stored or compared by Gatehouse is in this form.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
