//! Data entries: the example business record owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
  pub id:          Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub value:       f64,
  pub category:    Option<String>,
  pub owner_email: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input for creating an entry. The owner is supplied separately, from the
/// session, never from the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataEntry {
  pub title:       String,
  pub description: Option<String>,
  #[serde(default)]
  pub value:       f64,
  pub category:    Option<String>,
}

impl NewDataEntry {
  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    validate_value(self.value)
  }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub value:       Option<f64>,
  pub category:    Option<String>,
}

impl EntryPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if let Some(value) = self.value {
      validate_value(value)?;
    }
    Ok(())
  }
}

fn validate_title(title: &str) -> Result<()> {
  let title = title.trim();
  if title.is_empty() {
    return Err(Error::validation("title", "this field is required"));
  }
  if title.chars().count() > MAX_TITLE_LEN {
    return Err(Error::validation(
      "title",
      format!("must be at most {MAX_TITLE_LEN} characters"),
    ));
  }
  Ok(())
}

fn validate_value(value: f64) -> Result<()> {
  if !value.is_finite() {
    return Err(Error::validation("value", "must be a finite number"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_entry(title: &str) -> NewDataEntry {
    NewDataEntry { title: title.into(), description: None, value: 1.5, category: None }
  }

  #[test]
  fn blank_title_is_rejected() {
    let err = new_entry("   ").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "title", .. }));
  }

  #[test]
  fn overlong_title_is_rejected() {
    let title = "x".repeat(MAX_TITLE_LEN + 1);
    assert!(new_entry(&title).validate().is_err());
    assert!(new_entry(&"x".repeat(MAX_TITLE_LEN)).validate().is_ok());
  }

  #[test]
  fn non_finite_value_is_rejected() {
    let mut entry = new_entry("ok");
    entry.value   = f64::NAN;
    assert!(matches!(entry.validate(), Err(Error::Validation { field: "value", .. })));
  }

  #[test]
  fn empty_patch_is_valid() {
    assert!(EntryPatch::default().validate().is_ok());
    let bad = EntryPatch { title: Some(String::new()), ..Default::default() };
    assert!(bad.validate().is_err());
  }
}
