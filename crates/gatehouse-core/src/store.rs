//! The `DashboardStore` trait: Gatehouse's persistence gateway.
//!
//! The trait is implemented by storage backends (`gatehouse-store-sqlite`,
//! `gatehouse-store-postgres`). Higher layers depend on this abstraction,
//! not on any concrete backend.
//!
//! Every method acquires whatever connection it needs for the duration of
//! the call and releases it before the returned future resolves, on success
//! and on error alike. Callers never hold a connection between calls.

use std::future::Future;

use serde_json::Value;
use uuid::Uuid;

use crate::{
  activity::{ActivityRecord, AppStats, NewActivity, UserStats},
  entry::{DataEntry, EntryPatch, NewDataEntry},
  identity::Identity,
  profile::UserProfile,
};

/// Abstraction over a Gatehouse storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DashboardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── User profiles ─────────────────────────────────────────────────────

  /// Insert a profile for `identity`, or refresh the name, picture and
  /// `last_login` of the existing one (matched on email).
  fn upsert_user(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  fn get_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + 'a;

  /// All profiles, oldest first.
  fn list_users(&self) -> impl Future<Output = Result<Vec<UserProfile>, Self::Error>> + Send + '_;

  /// Returns `None` if no profile exists for `email`.
  fn set_user_active<'a>(
    &'a self,
    email: &'a str,
    active: bool,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + 'a;

  /// Replace the stored preferences. Returns `None` if no profile exists.
  fn set_preferences<'a>(
    &'a self,
    email: &'a str,
    preferences: Value,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + 'a;

  // ── Activity (append-only) ───────────────────────────────────────────

  /// Persist an activity record. The timestamp is set by the store.
  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<ActivityRecord, Self::Error>> + Send + '_;

  /// The `limit` most recent records, newest first.
  fn recent_activity(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ActivityRecord>, Self::Error>> + Send + '_;

  /// Action count and most viewed pages for one actor.
  fn user_stats<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<UserStats, Self::Error>> + Send + 'a;

  fn app_stats(&self) -> impl Future<Output = Result<AppStats, Self::Error>> + Send + '_;

  // ── Data entries ──────────────────────────────────────────────────────

  fn create_entry<'a>(
    &'a self,
    owner_email: &'a str,
    input: NewDataEntry,
  ) -> impl Future<Output = Result<DataEntry, Self::Error>> + Send + 'a;

  fn get_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DataEntry>, Self::Error>> + Send + '_;

  /// Entries owned by `owner_email`, newest first.
  fn list_entries<'a>(
    &'a self,
    owner_email: &'a str,
  ) -> impl Future<Output = Result<Vec<DataEntry>, Self::Error>> + Send + 'a;

  /// Returns `None` if the entry does not exist.
  fn update_entry(
    &self,
    id: Uuid,
    patch: EntryPatch,
  ) -> impl Future<Output = Result<Option<DataEntry>, Self::Error>> + Send + '_;

  /// Returns `true` if an entry was deleted.
  fn delete_entry(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Drop every table and recreate the schema. Destroys all data.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
