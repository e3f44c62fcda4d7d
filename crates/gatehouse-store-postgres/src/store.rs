//! [`PgStore`]: the PostgreSQL implementation of [`DashboardStore`].

use chrono::Utc;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};
use uuid::Uuid;

use gatehouse_core::{
  activity::{ActivityRecord, AppStats, NewActivity, PAGE_VIEW, PageCount, TOP_PAGES_LIMIT, UserStats},
  entry::{DataEntry, EntryPatch, NewDataEntry},
  identity::Identity,
  profile::UserProfile,
  session::ANONYMOUS_ACTOR,
  store::DashboardStore,
};

use crate::{
  rows::{ACTIVITY_COLUMNS, ActivityRow, ENTRY_COLUMNS, EntryRow, USER_COLUMNS, UserRow},
  schema::{DROP_ALL, SCHEMA},
  Result,
};

const MAX_CONNECTIONS: u32 = 5;

/// A Gatehouse store backed by a PostgreSQL connection pool.
///
/// Cloning is cheap; the pool is reference-counted.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  /// Connect to `url` and run schema initialisation.
  pub async fn connect(url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(MAX_CONNECTIONS)
      .connect(url)
      .await?;
    let store = Self::from_pool(pool).await?;
    tracing::info!("connected to postgres store");
    Ok(store)
  }

  /// Wrap an existing pool and run schema initialisation.
  pub async fn from_pool(pool: PgPool) -> Result<Self> {
    let store = Self { pool };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    Ok(())
  }
}

impl DashboardStore for PgStore {
  type Error = crate::Error;

  // ── User profiles ─────────────────────────────────────────────────────────

  async fn upsert_user(&self, identity: Identity) -> Result<UserProfile> {
    let row: UserRow = sqlx::query_as(&format!(
      "INSERT INTO users (id, email, subject, name, picture_url, is_active,
                          created_at, updated_at, last_login)
       VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6, $6)
       ON CONFLICT (email) DO UPDATE SET
         subject     = EXCLUDED.subject,
         name        = EXCLUDED.name,
         picture_url = EXCLUDED.picture_url,
         updated_at  = EXCLUDED.updated_at,
         last_login  = EXCLUDED.last_login
       RETURNING {USER_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(identity.email)
    .bind(identity.subject)
    .bind(identity.name)
    .bind(identity.picture)
    .bind(Utc::now())
    .fetch_one(&self.pool)
    .await?;

    Ok(row.into())
  }

  async fn get_user(&self, email: &str) -> Result<Option<UserProfile>> {
    let row: Option<UserRow> =
      sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

    Ok(row.map(Into::into))
  }

  async fn list_users(&self) -> Result<Vec<UserProfile>> {
    let rows: Vec<UserRow> =
      sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email"))
        .fetch_all(&self.pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn set_user_active(&self, email: &str, active: bool) -> Result<Option<UserProfile>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
      "UPDATE users SET is_active = $2, updated_at = $3 WHERE email = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(active)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }

  async fn set_preferences(&self, email: &str, preferences: Value) -> Result<Option<UserProfile>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
      "UPDATE users SET preferences = $2, updated_at = $3 WHERE email = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(preferences)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }

  // ── Activity (append-only) ───────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityRecord> {
    let row: ActivityRow = sqlx::query_as(&format!(
      "INSERT INTO activity_logs (
         id, actor_email, action, page, details, timestamp, ip_address, user_agent
       ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
       RETURNING {ACTIVITY_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(input.actor_email)
    .bind(input.action)
    .bind(input.page)
    .bind(input.details.map(Json))
    .bind(Utc::now())
    .bind(input.ip_address)
    .bind(input.user_agent)
    .fetch_one(&self.pool)
    .await?;

    Ok(row.into())
  }

  async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
    let rows: Vec<ActivityRow> = sqlx::query_as(&format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activity_logs ORDER BY timestamp DESC, seq DESC LIMIT $1"
    ))
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn user_stats(&self, email: &str) -> Result<UserStats> {
    let total: i64 =
      sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE actor_email = $1")
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

    let pages: Vec<(String, i64)> = sqlx::query_as(
      "SELECT page, COUNT(*) AS views
       FROM activity_logs
       WHERE actor_email = $1 AND action = $2 AND page IS NOT NULL
       GROUP BY page
       ORDER BY views DESC, page ASC
       LIMIT $3",
    )
    .bind(email)
    .bind(PAGE_VIEW)
    .bind(TOP_PAGES_LIMIT as i64)
    .fetch_all(&self.pool)
    .await?;

    Ok(UserStats {
      total_actions:      total as u64,
      most_visited_pages: pages
        .into_iter()
        .map(|(page, count)| PageCount { page, count: count as u64 })
        .collect(),
    })
  }

  async fn app_stats(&self) -> Result<AppStats> {
    let (users, active, actions): (i64, i64, i64) = sqlx::query_as(
      "SELECT
         (SELECT COUNT(*) FROM users),
         (SELECT COUNT(DISTINCT actor_email) FROM activity_logs WHERE actor_email <> $1),
         (SELECT COUNT(*) FROM activity_logs)",
    )
    .bind(ANONYMOUS_ACTOR)
    .fetch_one(&self.pool)
    .await?;

    Ok(AppStats {
      total_users:   users as u64,
      active_users:  active as u64,
      total_actions: actions as u64,
    })
  }

  // ── Data entries ──────────────────────────────────────────────────────────

  async fn create_entry(&self, owner_email: &str, input: NewDataEntry) -> Result<DataEntry> {
    let row: EntryRow = sqlx::query_as(&format!(
      "INSERT INTO data_entries (
         id, title, description, value, category, owner_email, created_at, updated_at
       ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
       RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(input.title)
    .bind(input.description)
    .bind(input.value)
    .bind(input.category)
    .bind(owner_email)
    .bind(Utc::now())
    .fetch_one(&self.pool)
    .await?;

    Ok(row.into())
  }

  async fn get_entry(&self, id: Uuid) -> Result<Option<DataEntry>> {
    let row: Option<EntryRow> =
      sqlx::query_as(&format!("SELECT {ENTRY_COLUMNS} FROM data_entries WHERE id = $1"))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

    Ok(row.map(Into::into))
  }

  async fn list_entries(&self, owner_email: &str) -> Result<Vec<DataEntry>> {
    let rows: Vec<EntryRow> = sqlx::query_as(&format!(
      "SELECT {ENTRY_COLUMNS} FROM data_entries WHERE owner_email = $1 ORDER BY created_at DESC, seq DESC"
    ))
    .bind(owner_email)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn update_entry(&self, id: Uuid, patch: EntryPatch) -> Result<Option<DataEntry>> {
    let row: Option<EntryRow> = sqlx::query_as(&format!(
      "UPDATE data_entries SET
         title       = COALESCE($2, title),
         description = COALESCE($3, description),
         value       = COALESCE($4, value),
         category    = COALESCE($5, category),
         updated_at  = $6
       WHERE id = $1
       RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.title)
    .bind(patch.description)
    .bind(patch.value)
    .bind(patch.category)
    .bind(Utc::now())
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }

  async fn delete_entry(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM data_entries WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;

    Ok(result.rows_affected() > 0)
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn reset(&self) -> Result<()> {
    // One simple-query batch runs as a single implicit transaction.
    sqlx::raw_sql(&format!("{DROP_ALL}{SCHEMA}"))
      .execute(&self.pool)
      .await?;
    tracing::warn!("postgres store reset; all data dropped");
    Ok(())
  }
}
