//! Encoding and decoding helpers between Gatehouse domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order matches chronological order.
//! JSON payloads are stored compact. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use gatehouse_core::{
  activity::{ActivityRecord, Details},
  entry::DataEntry,
  profile::UserProfile,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── JSON ─────────────────────────────────────────────────────────────────────

pub fn encode_json(value: &Value) -> Result<String> { Ok(serde_json::to_string(value)?) }

pub fn encode_details(details: &Details) -> Result<String> { Ok(serde_json::to_string(details)?) }

fn decode_json(s: Option<String>) -> Result<Option<Value>> {
  s.as_deref().map(serde_json::from_str).transpose().map_err(Error::from)
}

fn decode_details(s: Option<String>) -> Result<Option<Details>> {
  s.as_deref().map(serde_json::from_str).transpose().map_err(Error::from)
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, email, subject, name, picture_url, is_active, \
                                created_at, updated_at, last_login, preferences";

/// Raw column values from the `users` table.
pub struct RawUser {
  pub id:          String,
  pub email:       String,
  pub subject:     String,
  pub name:        Option<String>,
  pub picture_url: Option<String>,
  pub is_active:   bool,
  pub created_at:  String,
  pub updated_at:  String,
  pub last_login:  Option<String>,
  pub preferences: Option<String>,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      email:       row.get(1)?,
      subject:     row.get(2)?,
      name:        row.get(3)?,
      picture_url: row.get(4)?,
      is_active:   row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
      last_login:  row.get(8)?,
      preferences: row.get(9)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      id:          decode_uuid(&self.id)?,
      email:       self.email,
      subject:     self.subject,
      name:        self.name,
      picture_url: self.picture_url,
      is_active:   self.is_active,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
      last_login:  decode_opt_dt(self.last_login)?,
      preferences: decode_json(self.preferences)?,
    })
  }
}

pub const ACTIVITY_COLUMNS: &str =
  "id, actor_email, action, page, details, timestamp, ip_address, user_agent";

/// Raw column values from the `activity_logs` table.
pub struct RawActivity {
  pub id:          String,
  pub actor_email: String,
  pub action:      String,
  pub page:        Option<String>,
  pub details:     Option<String>,
  pub timestamp:   String,
  pub ip_address:  Option<String>,
  pub user_agent:  Option<String>,
}

impl RawActivity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      actor_email: row.get(1)?,
      action:      row.get(2)?,
      page:        row.get(3)?,
      details:     row.get(4)?,
      timestamp:   row.get(5)?,
      ip_address:  row.get(6)?,
      user_agent:  row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<ActivityRecord> {
    Ok(ActivityRecord {
      id:          decode_uuid(&self.id)?,
      actor_email: self.actor_email,
      action:      self.action,
      page:        self.page,
      details:     decode_details(self.details)?,
      timestamp:   decode_dt(&self.timestamp)?,
      ip_address:  self.ip_address,
      user_agent:  self.user_agent,
    })
  }
}

pub const ENTRY_COLUMNS: &str =
  "id, title, description, value, category, owner_email, created_at, updated_at";

/// Raw column values from the `data_entries` table.
pub struct RawEntry {
  pub id:          String,
  pub title:       String,
  pub description: Option<String>,
  pub value:       f64,
  pub category:    Option<String>,
  pub owner_email: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      value:       row.get(3)?,
      category:    row.get(4)?,
      owner_email: row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<DataEntry> {
    Ok(DataEntry {
      id:          decode_uuid(&self.id)?,
      title:       self.title,
      description: self.description,
      value:       self.value,
      category:    self.category,
      owner_email: self.owner_email,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let earlier = decode_dt("2024-01-01T12:00:00.5Z").unwrap();
    let later   = decode_dt("2024-01-01T12:00:01Z").unwrap();
    assert!(encode_dt(earlier) < encode_dt(later));
    assert_eq!(encode_dt(later), "2024-01-01T12:00:01.000000Z");
  }

  #[test]
  fn now_round_trips_exactly() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }
}
