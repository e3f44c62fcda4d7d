//! In-memory store used by this crate's unit tests.

use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  activity::{ActivityRecord, AppStats, NewActivity, UserStats},
  entry::{DataEntry, EntryPatch, NewDataEntry},
  identity::Identity,
  profile::UserProfile,
  store::DashboardStore,
};

#[derive(Debug, thiserror::Error)]
#[error("memory store unavailable")]
pub struct Unavailable;

#[derive(Default)]
pub struct MemoryStore {
  activity: Mutex<Vec<ActivityRecord>>,
  failing:  bool,
}

impl MemoryStore {
  /// A store whose every call fails.
  pub fn failing() -> Self { Self { failing: true, ..Self::default() } }

  pub fn activity_count(&self) -> usize { self.activity.lock().unwrap().len() }

  fn check(&self) -> Result<(), Unavailable> {
    if self.failing { Err(Unavailable) } else { Ok(()) }
  }
}

impl DashboardStore for MemoryStore {
  type Error = Unavailable;

  async fn upsert_user(&self, _: Identity) -> Result<UserProfile, Unavailable> { unimplemented!() }
  async fn get_user(&self, _: &str) -> Result<Option<UserProfile>, Unavailable> { unimplemented!() }
  async fn list_users(&self) -> Result<Vec<UserProfile>, Unavailable> { unimplemented!() }
  async fn set_user_active(&self, _: &str, _: bool) -> Result<Option<UserProfile>, Unavailable> { unimplemented!() }
  async fn set_preferences(&self, _: &str, _: Value) -> Result<Option<UserProfile>, Unavailable> { unimplemented!() }

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityRecord, Unavailable> {
    self.check()?;
    let record = ActivityRecord::from_new(input, Utc::now());
    self.activity.lock().unwrap().push(record.clone());
    Ok(record)
  }

  async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, Unavailable> {
    self.check()?;
    let all = self.activity.lock().unwrap();
    Ok(all.iter().rev().take(limit).cloned().collect())
  }

  async fn user_stats(&self, email: &str) -> Result<UserStats, Unavailable> {
    self.check()?;
    let all = self.activity.lock().unwrap();
    let total_actions = all.iter().filter(|r| r.actor_email == email).count() as u64;
    Ok(UserStats { total_actions, most_visited_pages: Vec::new() })
  }

  async fn app_stats(&self) -> Result<AppStats, Unavailable> {
    self.check()?;
    let total_actions = self.activity.lock().unwrap().len() as u64;
    Ok(AppStats { total_users: 0, active_users: 0, total_actions })
  }

  async fn create_entry(&self, _: &str, _: NewDataEntry) -> Result<DataEntry, Unavailable> { unimplemented!() }
  async fn get_entry(&self, _: Uuid) -> Result<Option<DataEntry>, Unavailable> { unimplemented!() }
  async fn list_entries(&self, _: &str) -> Result<Vec<DataEntry>, Unavailable> { unimplemented!() }
  async fn update_entry(&self, _: Uuid, _: EntryPatch) -> Result<Option<DataEntry>, Unavailable> { unimplemented!() }
  async fn delete_entry(&self, _: Uuid) -> Result<bool, Unavailable> { unimplemented!() }
  async fn reset(&self) -> Result<(), Unavailable> { unimplemented!() }
}
