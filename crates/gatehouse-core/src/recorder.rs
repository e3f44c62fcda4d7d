//! The event recorder: best-effort activity tracking.
//!
//! Every tracked event is logged through `tracing`. When analytics is
//! enabled the event is also written to the store as an
//! [`ActivityRecord`]. A failed write is logged and dropped; tracking never
//! turns into an error for the page that triggered it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
  activity::{ActivityRecord, AppStats, Details, NewActivity, PAGE_VIEW, UserStats},
  session::SessionContext,
  store::DashboardStore,
};

pub struct EventRecorder<S> {
  store:   Arc<S>,
  enabled: bool,
}

impl<S> Clone for EventRecorder<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), enabled: self.enabled } }
}

impl<S: DashboardStore> EventRecorder<S> {
  pub fn new(store: Arc<S>, enabled: bool) -> Self { Self { store, enabled } }

  pub fn is_enabled(&self) -> bool { self.enabled }

  /// Record that the session's user opened `page`.
  pub async fn track_page_view(&self, ctx: &SessionContext, page: &str) -> Option<ActivityRecord> {
    self.track(activity_for(ctx, PAGE_VIEW).on_page(page)).await
  }

  /// Record an arbitrary user action.
  pub async fn track_action(
    &self,
    ctx: &SessionContext,
    action: &str,
    details: Option<Details>,
    page: Option<&str>,
  ) -> Option<ActivityRecord> {
    let mut activity = activity_for(ctx, action);
    activity.details = details;
    activity.page    = page.map(str::to_owned);
    self.track(activity).await
  }

  /// Log `activity` and, if analytics is on, persist it.
  ///
  /// Returns the stored record, or `None` when analytics is disabled or the
  /// write failed.
  pub async fn track(&self, activity: NewActivity) -> Option<ActivityRecord> {
    info!(
      actor  = %activity.actor_email,
      action = %activity.action,
      page   = activity.page.as_deref(),
      "user activity"
    );

    if !self.enabled {
      return None;
    }

    match self.store.record_activity(activity).await {
      Ok(record) => Some(record),
      Err(e) => {
        warn!(error = %e, "failed to record activity");
        None
      }
    }
  }

  /// Per-user statistics. Unlike tracking, failures are returned.
  pub async fn user_stats(&self, email: &str) -> Result<UserStats, S::Error> {
    self.store.user_stats(email).await
  }

  pub async fn app_stats(&self) -> Result<AppStats, S::Error> { self.store.app_stats().await }
}

fn activity_for(ctx: &SessionContext, action: &str) -> NewActivity {
  let mut activity = NewActivity::new(ctx.actor(), action);
  activity.ip_address = ctx.origin().ip_address.clone();
  activity.user_agent = ctx.origin().user_agent.clone();
  activity
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use super::*;
  use crate::{
    identity::{AdminSet, Identity},
    session::Origin,
    testing::MemoryStore,
  };

  fn signed_in() -> SessionContext {
    SessionContext::signed_in(
      Identity::new("dev@x.com", "sub-dev"),
      Arc::new(AdminSet::default()),
    )
  }

  #[tokio::test]
  async fn disabled_recorder_writes_nothing() {
    let store    = Arc::new(MemoryStore::default());
    let recorder = EventRecorder::new(Arc::clone(&store), false);

    for _ in 0..10 {
      assert!(recorder.track_page_view(&signed_in(), "home").await.is_none());
      assert!(recorder.track_action(&signed_in(), "click", None, None).await.is_none());
    }
    assert_eq!(store.activity_count(), 0);
  }

  #[tokio::test]
  async fn enabled_recorder_writes_page_view() {
    let store    = Arc::new(MemoryStore::default());
    let recorder = EventRecorder::new(Arc::clone(&store), true);

    let record = recorder.track_page_view(&signed_in(), "analytics").await.unwrap();
    assert_eq!(record.action, PAGE_VIEW);
    assert_eq!(record.page.as_deref(), Some("analytics"));
    assert_eq!(record.actor_email, "dev@x.com");
    assert_eq!(store.activity_count(), 1);
  }

  #[tokio::test]
  async fn anonymous_actions_are_attributed_to_anonymous() {
    let store    = Arc::new(MemoryStore::default());
    let recorder = EventRecorder::new(Arc::clone(&store), true);
    let ctx      = SessionContext::anonymous(Arc::new(AdminSet::default()));

    let mut details = Details::new();
    details.insert("button".into(), json!("export"));

    let record = recorder
      .track_action(&ctx, "button_click", Some(details.clone()), Some("home"))
      .await
      .unwrap();
    assert_eq!(record.actor_email, "anonymous");
    assert_eq!(record.details, Some(details));
  }

  #[tokio::test]
  async fn origin_is_copied_onto_records() {
    let store    = Arc::new(MemoryStore::default());
    let recorder = EventRecorder::new(Arc::clone(&store), true);
    let ctx      = signed_in().with_origin(Origin {
      ip_address: Some("10.0.0.7".into()),
      user_agent: Some("curl/8".into()),
    });

    let record = recorder.track_page_view(&ctx, "home").await.unwrap();
    assert_eq!(record.ip_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(record.user_agent.as_deref(), Some("curl/8"));
  }

  #[tokio::test]
  async fn write_failures_are_swallowed() {
    let store    = Arc::new(MemoryStore::failing());
    let recorder = EventRecorder::new(Arc::clone(&store), true);

    assert!(recorder.track_page_view(&signed_in(), "home").await.is_none());
    assert_eq!(store.activity_count(), 0);
  }

  #[tokio::test]
  async fn stats_failures_are_returned() {
    let recorder = EventRecorder::new(Arc::new(MemoryStore::failing()), true);
    assert!(recorder.app_stats().await.is_err());
    assert!(recorder.user_stats("dev@x.com").await.is_err());
  }
}
