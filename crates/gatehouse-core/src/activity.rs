//! Activity records and the statistics derived from them.
//!
//! Activity records are append-only. Nothing in Gatehouse updates or deletes
//! one after it has been written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Action name used for page views.
pub const PAGE_VIEW: &str = "page_view";

/// Free-form details attached to an action.
pub type Details = Map<String, Value>;

/// Input to [`DashboardStore::record_activity`](crate::store::DashboardStore::record_activity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
  pub actor_email: String,
  pub action:      String,
  pub page:        Option<String>,
  pub details:     Option<Details>,
  pub ip_address:  Option<String>,
  pub user_agent:  Option<String>,
}

impl NewActivity {
  pub fn new(actor_email: impl Into<String>, action: impl Into<String>) -> Self {
    Self {
      actor_email: actor_email.into(),
      action:      action.into(),
      page:        None,
      details:     None,
      ip_address:  None,
      user_agent:  None,
    }
  }

  pub fn on_page(mut self, page: impl Into<String>) -> Self {
    self.page = Some(page.into());
    self
  }

  pub fn with_details(mut self, details: Details) -> Self {
    self.details = Some(details);
    self
  }
}

/// A persisted activity record. The `timestamp` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
  pub id:          Uuid,
  pub actor_email: String,
  pub action:      String,
  pub page:        Option<String>,
  pub details:     Option<Details>,
  pub timestamp:   DateTime<Utc>,
  pub ip_address:  Option<String>,
  pub user_agent:  Option<String>,
}

impl ActivityRecord {
  /// Stamp a [`NewActivity`] with a fresh id and time.
  pub fn from_new(input: NewActivity, timestamp: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      actor_email: input.actor_email,
      action: input.action,
      page: input.page,
      details: input.details,
      timestamp,
      ip_address: input.ip_address,
      user_agent: input.user_agent,
    }
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Number of pages reported in [`UserStats::most_visited_pages`].
pub const TOP_PAGES_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
  pub page:  String,
  pub count: u64,
}

/// Per-user activity summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
  pub total_actions:      u64,
  /// Page views grouped by page, most viewed first.
  pub most_visited_pages: Vec<PageCount>,
}

/// Application-wide activity summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppStats {
  pub total_users:   u64,
  /// Distinct signed-in actors with at least one recorded action. Activity
  /// attributed to the anonymous actor is not counted.
  pub active_users:  u64,
  pub total_actions: u64,
}

impl AppStats {
  /// Share of known users that have done anything, as a percentage.
  pub fn engagement_rate(&self) -> f64 {
    if self.total_users == 0 {
      return 0.0;
    }
    self.active_users as f64 / self.total_users as f64 * 100.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn engagement_rate_handles_zero_users() {
    assert_eq!(AppStats::default().engagement_rate(), 0.0);
    let stats = AppStats { total_users: 4, active_users: 1, total_actions: 9 };
    assert!((stats.engagement_rate() - 25.0).abs() < f64::EPSILON);
  }
}
