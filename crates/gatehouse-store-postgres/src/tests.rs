//! Tests against a live PostgreSQL server.
//!
//! Skipped unless `GATEHOUSE_TEST_POSTGRES_URL` points at a database the
//! tests may write to. Every test uses fresh email addresses so they can run
//! concurrently against the same database.

use gatehouse_core::{
  activity::{NewActivity, PAGE_VIEW},
  entry::{EntryPatch, NewDataEntry},
  identity::Identity,
  store::DashboardStore,
};
use serde_json::json;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

use crate::PgStore;

async fn store() -> Option<PgStore> {
  let url = std::env::var("GATEHOUSE_TEST_POSTGRES_URL").ok()?;
  Some(PgStore::connect(&url).await.expect("postgres store"))
}

fn unique_email() -> String { format!("{}@example.com", Uuid::new_v4()) }

#[tokio::test]
async fn user_profile_lifecycle() {
  let Some(s) = store().await else { return };
  let email   = unique_email();

  let created = s
    .upsert_user(Identity::new(&email, format!("sub-{email}")).with_name("Pat"))
    .await
    .unwrap();
  assert!(created.is_active);

  let again = s
    .upsert_user(Identity::new(&email, format!("sub-{email}")).with_name("Pat Q."))
    .await
    .unwrap();
  assert_eq!(again.id, created.id);
  assert_eq!(again.name.as_deref(), Some("Pat Q."));

  let prefs = json!({ "theme": "dark" });
  let updated = s.set_preferences(&email, prefs.clone()).await.unwrap().unwrap();
  assert_eq!(updated.preferences, Some(prefs));

  let inactive = s.set_user_active(&email, false).await.unwrap().unwrap();
  assert!(!inactive.is_active);
}

#[tokio::test]
async fn activity_and_stats() {
  let Some(s) = store().await else { return };
  let email   = unique_email();

  for page in ["home", "home", "analytics"] {
    s.record_activity(NewActivity::new(&email, PAGE_VIEW).on_page(page))
      .await
      .unwrap();
  }

  let stats = s.user_stats(&email).await.unwrap();
  assert_eq!(stats.total_actions, 3);
  assert_eq!(stats.most_visited_pages[0].page, "home");
  assert_eq!(stats.most_visited_pages[0].count, 2);
}

#[tokio::test]
async fn entry_crud() {
  let Some(s) = store().await else { return };
  let owner   = unique_email();

  let created = s
    .create_entry(
      &owner,
      NewDataEntry { title: "t".into(), description: None, value: 1.0, category: None },
    )
    .await
    .unwrap();

  let updated = s
    .update_entry(created.id, EntryPatch { value: Some(2.0), ..Default::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.value, 2.0);
  assert_eq!(s.list_entries(&owner).await.unwrap().len(), 1);

  assert!(s.delete_entry(created.id).await.unwrap());
  assert!(s.get_entry(created.id).await.unwrap().is_none());
}

/// `reset` wipes every table, so it runs in a throwaway schema to keep the
/// other tests' rows intact.
#[tokio::test]
async fn reset_drops_all_rows_and_keeps_schema() {
  let Ok(url) = std::env::var("GATEHOUSE_TEST_POSTGRES_URL") else { return };
  let schema  = format!("gatehouse_reset_{}", Uuid::new_v4().simple());

  let admin = PgPoolOptions::new().max_connections(1).connect(&url).await.unwrap();
  sqlx::raw_sql(&format!("CREATE SCHEMA {schema}")).execute(&admin).await.unwrap();

  let options: PgConnectOptions = url.parse().unwrap();
  let pool = PgPoolOptions::new()
    .max_connections(2)
    .connect_with(options.options([("search_path", schema.as_str())]))
    .await
    .unwrap();
  let s = PgStore::from_pool(pool).await.unwrap();

  let email = unique_email();
  s.upsert_user(Identity::new(&email, "sub")).await.unwrap();
  s.record_activity(NewActivity::new(&email, PAGE_VIEW).on_page("home")).await.unwrap();

  s.reset().await.unwrap();

  assert!(s.list_users().await.unwrap().is_empty());
  assert!(s.recent_activity(10).await.unwrap().is_empty());
  s.upsert_user(Identity::new(&email, "sub")).await.unwrap();
  assert_eq!(s.app_stats().await.unwrap().total_users, 1);

  sqlx::raw_sql(&format!("DROP SCHEMA {schema} CASCADE")).execute(&admin).await.unwrap();
}

#[tokio::test]
async fn recent_activity_is_newest_first() {
  let Some(s) = store().await else { return };
  let email   = unique_email();

  for action in ["first", "second", "third"] {
    s.record_activity(NewActivity::new(&email, action)).await.unwrap();
  }

  let recent: Vec<_> = s
    .recent_activity(1000)
    .await
    .unwrap()
    .into_iter()
    .filter(|r| r.actor_email == email)
    .map(|r| r.action)
    .collect();
  assert_eq!(recent, ["third", "second", "first"]);
}
