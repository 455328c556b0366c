//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use roster_core::person::PersonRecord;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Integers ─────────────────────────────────────────────────────────────────

/// SQLite integers are 64-bit; the domain types are narrower.
pub fn narrow<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T> {
  T::try_from(value).map_err(|_| Error::Corrupt { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "record, id, first_name, middle_name, \
                                  last_name, email, age, version, is_latest, \
                                  created_date";

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub record:       i64,
  pub id:           String,
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub email:        String,
  pub age:          i64,
  pub version:      i64,
  pub is_latest:    bool,
  pub created_date: String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawPerson {
      record:       row.get(0)?,
      id:           row.get(1)?,
      first_name:   row.get(2)?,
      middle_name:  row.get(3)?,
      last_name:    row.get(4)?,
      email:        row.get(5)?,
      age:          row.get(6)?,
      version:      row.get(7)?,
      is_latest:    row.get(8)?,
      created_date: row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<PersonRecord> {
    Ok(PersonRecord {
      record:      self.record,
      identity:    decode_uuid(&self.id)?,
      first_name:  self.first_name,
      middle_name: self.middle_name,
      last_name:   self.last_name,
      email:       self.email,
      age:         narrow("age", self.age)?,
      version:     narrow("version", self.version)?,
      is_latest:   self.is_latest,
      created_at:  decode_dt(&self.created_date)?,
    })
  }
}
