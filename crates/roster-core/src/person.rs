//! Person types — the versioned payload and the rows that carry it.
//!
//! A [`PersonRecord`] is one immutable version of a person. Edits never
//! rewrite a row; they append a new one with the next version number. The
//! only mutable column is `is_latest`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Upper bound on every text column (`varchar(50)` in the persisted schema).
pub const MAX_FIELD_LEN: usize = 50;

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One stored row: a single `(identity, version)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
  /// Store-assigned row id; unique across all identities.
  pub record:      i64,
  pub identity:    Uuid,
  pub first_name:  String,
  pub middle_name: Option<String>,
  pub last_name:   String,
  pub email:       String,
  pub age:         i32,
  pub version:     u32,
  pub is_latest:   bool,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

impl PersonRecord {
  /// The versioned payload of this row, detached from its bookkeeping.
  pub fn payload(&self) -> NewPerson {
    NewPerson {
      first_name:  self.first_name.clone(),
      middle_name: self.middle_name.clone(),
      last_name:   self.last_name.clone(),
      email:       self.email.clone(),
      age:         self.age,
    }
  }

  pub fn summary(&self) -> PersonSummary {
    PersonSummary {
      record:     self.record,
      identity:   self.identity,
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
      version:    self.version,
      is_latest:  self.is_latest,
    }
  }
}

/// The projection returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
  pub record:     i64,
  pub identity:   Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub version:    u32,
  pub is_latest:  bool,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::PersonStore::insert`] and the create endpoint.
/// `record`, `identity`, `version` and `created_at` are never accepted from
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
  pub first_name:  String,
  #[serde(default)]
  pub middle_name: Option<String>,
  pub last_name:   String,
  pub email:       String,
  pub age:         i32,
}

impl NewPerson {
  /// Check the payload against the column constraints of the `persons`
  /// table.
  pub fn validate(&self) -> Result<()> {
    required("first_name", &self.first_name)?;
    required("last_name", &self.last_name)?;
    required("email", &self.email)?;
    if let Some(middle) = &self.middle_name {
      bounded("middle_name", middle)?;
    }
    if !is_valid_email(&self.email) {
      return Err(Error::Validation(format!(
        "value is not a valid email address: {:?}",
        self.email
      )));
    }
    if self.age < 0 {
      return Err(Error::Validation(format!(
        "age must be non-negative, got {}",
        self.age
      )));
    }
    Ok(())
  }
}

fn required(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} must not be empty")));
  }
  bounded(field, value)
}

fn bounded(field: &str, value: &str) -> Result<()> {
  let len = value.chars().count();
  if len > MAX_FIELD_LEN {
    return Err(Error::Validation(format!(
      "{field} exceeds {MAX_FIELD_LEN} characters ({len})"
    )));
  }
  Ok(())
}

/// Accepts `local@domain.tld`: one `@`, no whitespace, and a dotted domain
/// whose labels are all non-empty.
fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && domain.split('.').all(|label| !label.is_empty())
}

/// A partial edit of the latest version of `identity`. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
  pub identity:    Uuid,
  #[serde(default)]
  pub first_name:  Option<String>,
  #[serde(default)]
  pub middle_name: Option<String>,
  #[serde(default)]
  pub last_name:   Option<String>,
  #[serde(default)]
  pub email:       Option<String>,
  #[serde(default)]
  pub age:         Option<i32>,
}

/// The fields of a [`PersonUpdate`] that actually differ from the current
/// row. Produced by [`PersonUpdate::diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChanges {
  pub first_name:  Option<String>,
  pub middle_name: Option<String>,
  pub last_name:   Option<String>,
  pub email:       Option<String>,
  pub age:         Option<i32>,
}

impl PersonUpdate {
  /// Keep only the supplied fields whose value differs from `current`.
  pub fn diff(&self, current: &PersonRecord) -> FieldChanges {
    fn changed<T: PartialEq + Clone>(new: &Option<T>, old: &T) -> Option<T> {
      new.as_ref().filter(|v| *v != old).cloned()
    }

    FieldChanges {
      first_name:  changed(&self.first_name, &current.first_name),
      middle_name: self
        .middle_name
        .as_ref()
        .filter(|m| current.middle_name.as_ref() != Some(*m))
        .cloned(),
      last_name:   changed(&self.last_name, &current.last_name),
      email:       changed(&self.email, &current.email),
      age:         changed(&self.age, &current.age),
    }
  }
}

impl FieldChanges {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Names of the changed fields, in column order. Used for logging.
  pub fn names(&self) -> Vec<&'static str> {
    let mut names = Vec::new();
    if self.first_name.is_some() {
      names.push("first_name");
    }
    if self.middle_name.is_some() {
      names.push("middle_name");
    }
    if self.last_name.is_some() {
      names.push("last_name");
    }
    if self.email.is_some() {
      names.push("email");
    }
    if self.age.is_some() {
      names.push("age");
    }
    names
  }

  /// Overlay the changes on `base`; unchanged fields are copied through.
  pub fn apply(self, base: NewPerson) -> NewPerson {
    NewPerson {
      first_name:  self.first_name.unwrap_or(base.first_name),
      middle_name: self.middle_name.or(base.middle_name),
      last_name:   self.last_name.unwrap_or(base.last_name),
      email:       self.email.unwrap_or(base.email),
      age:         self.age.unwrap_or(base.age),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn payload() -> NewPerson {
    NewPerson {
      first_name:  "a".into(),
      middle_name: None,
      last_name:   "b".into(),
      email:       "a@b.com".into(),
      age:         20,
    }
  }

  fn record() -> PersonRecord {
    PersonRecord {
      record:      1,
      identity:    Uuid::new_v4(),
      first_name:  "a".into(),
      middle_name: None,
      last_name:   "b".into(),
      email:       "a@b.com".into(),
      age:         20,
      version:     1,
      is_latest:   true,
      created_at:  Utc::now(),
    }
  }

  // ── Validation ──────────────────────────────────────────────────────────

  #[test]
  fn valid_payload_passes() {
    assert!(payload().validate().is_ok());
  }

  #[test]
  fn rejects_malformed_email() {
    for email in ["ab.com", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a@b..com"] {
      let p = NewPerson { email: email.into(), ..payload() };
      assert!(
        matches!(p.validate(), Err(Error::Validation(_))),
        "accepted {email:?}"
      );
    }
  }

  #[test]
  fn rejects_negative_age() {
    let p = NewPerson { age: -1, ..payload() };
    assert!(matches!(p.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn zero_age_is_allowed() {
    let p = NewPerson { age: 0, ..payload() };
    assert!(p.validate().is_ok());
  }

  #[test]
  fn rejects_blank_required_fields() {
    let p = NewPerson { first_name: "  ".into(), ..payload() };
    assert!(matches!(p.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn rejects_overlong_fields() {
    let p = NewPerson {
      middle_name: Some("x".repeat(MAX_FIELD_LEN + 1)),
      ..payload()
    };
    assert!(matches!(p.validate(), Err(Error::Validation(_))));

    let p = NewPerson { last_name: "x".repeat(MAX_FIELD_LEN), ..payload() };
    assert!(p.validate().is_ok());
  }

  // ── Diff / merge ────────────────────────────────────────────────────────

  #[test]
  fn diff_ignores_absent_and_unchanged_fields() {
    let current = record();
    let update = PersonUpdate {
      identity: current.identity,
      first_name: Some("a".into()),
      age: Some(21),
      ..Default::default()
    };

    let changes = update.diff(&current);
    assert_eq!(changes.names(), vec!["age"]);
    assert_eq!(changes.age, Some(21));
  }

  #[test]
  fn identical_update_is_empty() {
    let current = record();
    let update = PersonUpdate {
      identity: current.identity,
      first_name: Some("a".into()),
      last_name: Some("b".into()),
      email: Some("a@b.com".into()),
      age: Some(20),
      ..Default::default()
    };
    assert!(update.diff(&current).is_empty());
  }

  #[test]
  fn setting_middle_name_counts_as_change() {
    let current = record();
    let update = PersonUpdate {
      identity: current.identity,
      middle_name: Some("m".into()),
      ..Default::default()
    };
    assert_eq!(update.diff(&current).names(), vec!["middle_name"]);
  }

  #[test]
  fn apply_overlays_changes_on_current_payload() {
    let current = record();
    let changes = FieldChanges {
      email: Some("new@b.com".into()),
      ..Default::default()
    };

    let merged = changes.apply(current.payload());
    assert_eq!(merged.email, "new@b.com");
    assert_eq!(merged.first_name, "a");
    assert_eq!(merged.last_name, "b");
    assert_eq!(merged.age, 20);
  }

  #[test]
  fn summary_projects_listing_fields() {
    let current = record();
    let summary = current.summary();
    assert_eq!(summary.record, current.record);
    assert_eq!(summary.identity, current.identity);
    assert_eq!(summary.version, 1);
    assert!(summary.is_latest);

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("email").is_none());
    assert!(json.get("age").is_none());
  }
}
