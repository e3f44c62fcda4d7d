//! Stored user profiles.
//!
//! A profile is upserted from an [`Identity`](crate::identity::Identity) when
//! a signed-in user shows up. It deliberately has no role column: the admin
//! set in configuration is the only authority on roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id:          Uuid,
  pub email:       String,
  /// Provider-issued subject identifier.
  pub subject:     String,
  pub name:        Option<String>,
  pub picture_url: Option<String>,
  pub is_active:   bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub last_login:  Option<DateTime<Utc>>,
  /// Arbitrary user preferences, stored as JSON.
  pub preferences: Option<Value>,
}
