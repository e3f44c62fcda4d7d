//! Row types returned by sqlx and their conversions into domain types.

use chrono::{DateTime, Utc};
use gatehouse_core::{
  activity::{ActivityRecord, Details},
  entry::DataEntry,
  profile::UserProfile,
};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

pub const USER_COLUMNS: &str = "id, email, subject, name, picture_url, is_active, \
                                created_at, updated_at, last_login, preferences";

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
  id:          Uuid,
  email:       String,
  subject:     String,
  name:        Option<String>,
  picture_url: Option<String>,
  is_active:   bool,
  created_at:  DateTime<Utc>,
  updated_at:  DateTime<Utc>,
  last_login:  Option<DateTime<Utc>>,
  preferences: Option<Value>,
}

impl From<UserRow> for UserProfile {
  fn from(row: UserRow) -> Self {
    Self {
      id:          row.id,
      email:       row.email,
      subject:     row.subject,
      name:        row.name,
      picture_url: row.picture_url,
      is_active:   row.is_active,
      created_at:  row.created_at,
      updated_at:  row.updated_at,
      last_login:  row.last_login,
      preferences: row.preferences,
    }
  }
}

pub const ACTIVITY_COLUMNS: &str =
  "id, actor_email, action, page, details, timestamp, ip_address, user_agent";

#[derive(Debug, sqlx::FromRow)]
pub struct ActivityRow {
  id:          Uuid,
  actor_email: String,
  action:      String,
  page:        Option<String>,
  details:     Option<Json<Details>>,
  timestamp:   DateTime<Utc>,
  ip_address:  Option<String>,
  user_agent:  Option<String>,
}

impl From<ActivityRow> for ActivityRecord {
  fn from(row: ActivityRow) -> Self {
    Self {
      id:          row.id,
      actor_email: row.actor_email,
      action:      row.action,
      page:        row.page,
      details:     row.details.map(|Json(d)| d),
      timestamp:   row.timestamp,
      ip_address:  row.ip_address,
      user_agent:  row.user_agent,
    }
  }
}

pub const ENTRY_COLUMNS: &str =
  "id, title, description, value, category, owner_email, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct EntryRow {
  id:          Uuid,
  title:       String,
  description: Option<String>,
  value:       f64,
  category:    Option<String>,
  owner_email: String,
  created_at:  DateTime<Utc>,
  updated_at:  DateTime<Utc>,
}

impl From<EntryRow> for DataEntry {
  fn from(row: EntryRow) -> Self {
    Self {
      id:          row.id,
      title:       row.title,
      description: row.description,
      value:       row.value,
      category:    row.category,
      owner_email: row.owner_email,
      created_at:  row.created_at,
      updated_at:  row.updated_at,
    }
  }
}
