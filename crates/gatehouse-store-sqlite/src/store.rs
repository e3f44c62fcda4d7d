//! [`SqliteStore`]: the SQLite implementation of [`DashboardStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use serde_json::Value;
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
  encode::{
    ACTIVITY_COLUMNS, ENTRY_COLUMNS, RawActivity, RawEntry, RawUser, USER_COLUMNS, encode_details,
    encode_dt, encode_json, encode_uuid, now,
  },
  schema::{DROP_ALL, SCHEMA},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gatehouse store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let conn  = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_user(&self, email: String) -> Result<Option<UserProfile>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_profile).transpose()
  }
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

impl DashboardStore for SqliteStore {
  type Error = crate::Error;

  // ── User profiles ─────────────────────────────────────────────────────────

  async fn upsert_user(&self, identity: Identity) -> Result<UserProfile> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(now());
    let email  = identity.email.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (id, email, subject, name, picture_url, is_active,
                              created_at, updated_at, last_login)
           VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6, ?6)
           ON CONFLICT(email) DO UPDATE SET
             subject     = excluded.subject,
             name        = excluded.name,
             picture_url = excluded.picture_url,
             updated_at  = excluded.updated_at,
             last_login  = excluded.last_login",
          rusqlite::params![
            id_str,
            identity.email,
            identity.subject,
            identity.name,
            identity.picture,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    // A miss here means the row was deleted between the two statements.
    self
      .fetch_user(email.clone())
      .await?
      .ok_or(crate::Error::UserNotFound(email))
  }

  async fn get_user(&self, email: &str) -> Result<Option<UserProfile>> {
    self.fetch_user(email.to_owned()).await
  }

  async fn list_users(&self) -> Result<Vec<UserProfile>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email"))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_profile).collect()
  }

  async fn set_user_active(&self, email: &str, active: bool) -> Result<Option<UserProfile>> {
    let email_owned = email.to_owned();
    let at_str      = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = ?2, updated_at = ?3 WHERE email = ?1",
          rusqlite::params![email_owned, active, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_user(email.to_owned()).await
  }

  async fn set_preferences(&self, email: &str, preferences: Value) -> Result<Option<UserProfile>> {
    let email_owned = email.to_owned();
    let prefs_str   = encode_json(&preferences)?;
    let at_str      = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET preferences = ?2, updated_at = ?3 WHERE email = ?1",
          rusqlite::params![email_owned, prefs_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_user(email.to_owned()).await
  }

  // ── Activity (append-only) ───────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<ActivityRecord> {
    let record = ActivityRecord::from_new(input, now());

    let id_str      = encode_uuid(record.id);
    let actor       = record.actor_email.clone();
    let action      = record.action.clone();
    let page        = record.page.clone();
    let details_str = record.details.as_ref().map(encode_details).transpose()?;
    let at_str      = encode_dt(record.timestamp);
    let ip_address  = record.ip_address.clone();
    let user_agent  = record.user_agent.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activity_logs (
             id, actor_email, action, page, details, timestamp, ip_address, user_agent
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, actor, action, page, details_str, at_str, ip_address, user_agent,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLUMNS} FROM activity_logs
           ORDER BY timestamp DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_record).collect()
  }

  async fn user_stats(&self, email: &str) -> Result<UserStats> {
    let email_owned = email.to_owned();
    let top_limit   = TOP_PAGES_LIMIT as i64;

    let (total, pages): (i64, Vec<(String, i64)>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM activity_logs WHERE actor_email = ?1",
          rusqlite::params![email_owned],
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(
          "SELECT page, COUNT(*) AS views
           FROM activity_logs
           WHERE actor_email = ?1 AND action = ?2 AND page IS NOT NULL
           GROUP BY page
           ORDER BY views DESC, page ASC
           LIMIT ?3",
        )?;
        let pages = stmt
          .query_map(rusqlite::params![email_owned, PAGE_VIEW, top_limit], |r| {
            Ok((r.get(0)?, r.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, pages))
      })
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
    let (users, active, actions): (i64, i64, i64) = self
      .conn
      .call(|conn| {
        let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        let active: i64 = conn.query_row(
          "SELECT COUNT(DISTINCT actor_email) FROM activity_logs WHERE actor_email != ?1",
          rusqlite::params![ANONYMOUS_ACTOR],
          |r| r.get(0),
        )?;
        let actions: i64 =
          conn.query_row("SELECT COUNT(*) FROM activity_logs", [], |r| r.get(0))?;
        Ok((users, active, actions))
      })
      .await?;

    Ok(AppStats {
      total_users:   users as u64,
      active_users:  active as u64,
      total_actions: actions as u64,
    })
  }

  // ── Data entries ──────────────────────────────────────────────────────────

  async fn create_entry(&self, owner_email: &str, input: NewDataEntry) -> Result<DataEntry> {
    let at = now();
    let entry = DataEntry {
      id:          Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      value:       input.value,
      category:    input.category,
      owner_email: owner_email.to_owned(),
      created_at:  at,
      updated_at:  at,
    };

    let id_str      = encode_uuid(entry.id);
    let title       = entry.title.clone();
    let description = entry.description.clone();
    let value       = entry.value;
    let category    = entry.category.clone();
    let owner       = entry.owner_email.clone();
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO data_entries (
             id, title, description, value, category, owner_email, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, title, description, value, category, owner, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn get_entry(&self, id: Uuid) -> Result<Option<DataEntry>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEntry> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM data_entries WHERE id = ?1"),
            rusqlite::params![id_str],
            RawEntry::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEntry::into_entry).transpose()
  }

  async fn list_entries(&self, owner_email: &str) -> Result<Vec<DataEntry>> {
    let owner = owner_email.to_owned();

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTRY_COLUMNS} FROM data_entries
           WHERE owner_email = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn update_entry(&self, id: Uuid, patch: EntryPatch) -> Result<Option<DataEntry>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE data_entries SET
             title       = COALESCE(?2, title),
             description = COALESCE(?3, description),
             value       = COALESCE(?4, value),
             category    = COALESCE(?5, category),
             updated_at  = ?6
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            patch.title,
            patch.description,
            patch.value,
            patch.category,
            at_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_entry(id).await
  }

  async fn delete_entry(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM data_entries WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DROP_ALL)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::warn!("sqlite store reset; all data dropped");
    Ok(())
  }
}
