//! Building a [`SessionContext`] from a request.
//!
//! Gatehouse does not speak OAuth. It expects an authenticating reverse proxy
//! in front of it to run the provider flow and forward the signed-in
//! identity as request headers (see [`IdentityHeaderNames`]). Requests
//! without an email header are anonymous.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Utc};
use gatehouse_core::{
  identity::{AdminSet, Identity, normalize_email},
  session::{Origin, SessionContext},
  store::DashboardStore,
};

use crate::{AppState, config::IdentityHeaderNames};

/// Extractor yielding the request's [`SessionContext`]. Never rejects.
pub struct Session(pub SessionContext);

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: DashboardStore + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Session(session_from_headers(
      &parts.headers,
      &state.config.auth.headers,
      Arc::clone(&state.admins),
    )))
  }
}

/// Resolve the session for a set of request headers.
pub fn session_from_headers(
  headers: &HeaderMap,
  names:   &IdentityHeaderNames,
  admins:  Arc<AdminSet>,
) -> SessionContext {
  let ctx = match identity_from_headers(headers, names) {
    Some(identity) => SessionContext::signed_in(identity, admins),
    None => SessionContext::anonymous(admins),
  };
  ctx.with_origin(origin_from_headers(headers))
}

/// Read the forwarded identity, or `None` if there is no usable email.
pub fn identity_from_headers(headers: &HeaderMap, names: &IdentityHeaderNames) -> Option<Identity> {
  let email = normalize_email(header_str(headers, &names.email)?);

  // Not every provider forwards a subject; the email is unique too.
  let subject  = header_str(headers, &names.subject).map_or_else(|| email.clone(), str::to_owned);
  let mut identity = Identity::new(email, subject);
  identity.name           = header_str(headers, &names.name).map(str::to_owned);
  identity.picture        = header_str(headers, &names.picture).map(str::to_owned);
  identity.email_verified = header_str(headers, &names.email_verified)
    .is_some_and(|v| v.eq_ignore_ascii_case("true"));
  identity.expires_at     = header_str(headers, &names.expires).and_then(parse_expiry);
  Some(identity)
}

fn origin_from_headers(headers: &HeaderMap) -> Origin {
  let ip_address = header_str(headers, "x-forwarded-for")
    .and_then(|v| v.split(',').next())
    .map(|ip| ip.trim().to_owned())
    .filter(|ip| !ip.is_empty())
    .or_else(|| header_str(headers, "x-real-ip").map(str::to_owned));

  Origin {
    ip_address,
    user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_owned),
  }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

/// Accepts Unix seconds or RFC 3339.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(secs) = raw.parse::<i64>() {
    return DateTime::from_timestamp(secs, 0);
  }
  DateTime::parse_from_rfc3339(raw)
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use gatehouse_core::identity::Role;

  use super::*;

  fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(*k, HeaderValue::from_str(v).unwrap());
    }
    map
  }

  fn admins() -> Arc<AdminSet> { Arc::new(AdminSet::new(["boss@x.com"])) }

  #[test]
  fn no_headers_is_anonymous() {
    let ctx = session_from_headers(&HeaderMap::new(), &IdentityHeaderNames::default(), admins());
    assert!(!ctx.is_authenticated());
    assert_eq!(ctx.user_role(), Role::Anonymous);
  }

  #[test]
  fn blank_email_is_anonymous() {
    let h   = headers(&[("x-forwarded-email", "  ")]);
    let ctx = session_from_headers(&h, &IdentityHeaderNames::default(), admins());
    assert!(!ctx.is_authenticated());
  }

  #[test]
  fn full_identity_is_read() {
    let h = headers(&[
      ("x-forwarded-email", "boss@x.com"),
      ("x-forwarded-user", "google-123"),
      ("x-forwarded-preferred-username", "The Boss"),
      ("x-forwarded-email-verified", "TRUE"),
      ("x-forwarded-expires", "1700000000"),
    ]);
    let id = identity_from_headers(&h, &IdentityHeaderNames::default()).unwrap();
    assert_eq!(id.email, "boss@x.com");
    assert_eq!(id.subject, "google-123");
    assert_eq!(id.name.as_deref(), Some("The Boss"));
    assert!(id.email_verified);
    assert_eq!(id.expires_at, DateTime::from_timestamp(1_700_000_000, 0));
  }

  #[test]
  fn email_is_normalised() {
    let h  = headers(&[("x-forwarded-email", "Dev@Example.COM "), ("x-forwarded-user", "google-42")]);
    let id = identity_from_headers(&h, &IdentityHeaderNames::default()).unwrap();
    assert_eq!(id.email, "dev@example.com");
    assert_eq!(id.subject, "google-42");
  }

  #[test]
  fn subject_falls_back_to_email() {
    let h  = headers(&[("x-forwarded-email", "dev@x.com")]);
    let id = identity_from_headers(&h, &IdentityHeaderNames::default()).unwrap();
    assert_eq!(id.subject, "dev@x.com");
  }

  #[test]
  fn custom_header_names_are_honoured() {
    let names = IdentityHeaderNames { email: "x-auth-request-email".into(), ..Default::default() };
    let h     = headers(&[("x-auth-request-email", "boss@x.com")]);
    let ctx   = session_from_headers(&h, &names, admins());
    assert_eq!(ctx.user_role(), Role::Admin);
  }

  #[test]
  fn rfc3339_expiry_is_accepted() {
    assert_eq!(
      parse_expiry("2024-01-01T00:00:00Z"),
      DateTime::from_timestamp(1_704_067_200, 0),
    );
    assert_eq!(parse_expiry("soon"), None);
  }

  #[test]
  fn origin_prefers_first_forwarded_for() {
    let h = headers(&[
      ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
      ("user-agent", "Mozilla/5.0"),
    ]);
    let ctx = session_from_headers(&h, &IdentityHeaderNames::default(), admins());
    assert_eq!(ctx.origin().ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(ctx.origin().user_agent.as_deref(), Some("Mozilla/5.0"));
  }
}
