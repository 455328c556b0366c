//! [`SqliteStore`] — the SQLite implementation of [`PersonStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use roster_core::{
  person::{NewPerson, PersonRecord},
  store::{Deletion, PersonStore},
};

use crate::{
  Result,
  encode::{PERSON_COLUMNS, RawPerson, encode_dt, encode_uuid, narrow},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster person store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Flush and close the connection. Outstanding clones fail with a
  /// "connection closed" database error afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
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
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// Synchronous so they can run either on their own or inside one transaction.

/// Column values for a new row, prepared outside the connection thread.
struct RowInsert {
  id:         String,
  person:     NewPerson,
  version:    u32,
  is_latest:  bool,
  created_at: String,
}

impl RowInsert {
  fn new(identity: Uuid, person: NewPerson, version: u32, is_latest: bool) -> Self {
    Self {
      id: encode_uuid(identity),
      person,
      version,
      is_latest,
      created_at: encode_dt(Utc::now()),
    }
  }
}

fn insert_row(conn: &rusqlite::Connection, row: &RowInsert) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO persons (
       id, first_name, middle_name, last_name, email, age,
       version, is_latest, created_date
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      row.id,
      row.person.first_name,
      row.person.middle_name,
      row.person.last_name,
      row.person.email,
      row.person.age,
      row.version,
      row.is_latest,
      row.created_at,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

fn select_row(
  conn:    &rusqlite::Connection,
  id:      &str,
  version: Option<u32>,
) -> rusqlite::Result<Option<RawPerson>> {
  match version {
    Some(v) => conn
      .query_row(
        &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1 AND version = ?2"),
        rusqlite::params![id, v],
        RawPerson::from_row,
      )
      .optional(),
    None => conn
      .query_row(
        &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1 AND is_latest = 1"),
        rusqlite::params![id],
        RawPerson::from_row,
      )
      .optional(),
  }
}

/// Set `is_latest` on one row; with `expected` the write only applies when
/// the flag currently holds that value. Returns the number of rows changed.
fn write_flag(
  conn:     &rusqlite::Connection,
  id:       &str,
  version:  u32,
  expected: Option<bool>,
  value:    bool,
) -> rusqlite::Result<usize> {
  match expected {
    Some(current) => conn.execute(
      "UPDATE persons SET is_latest = ?4
       WHERE id = ?1 AND version = ?2 AND is_latest = ?3",
      rusqlite::params![id, version, current, value],
    ),
    None => conn.execute(
      "UPDATE persons SET is_latest = ?3 WHERE id = ?1 AND version = ?2",
      rusqlite::params![id, version, value],
    ),
  }
}

fn delete_row(conn: &rusqlite::Connection, id: &str, version: u32) -> rusqlite::Result<usize> {
  conn.execute(
    "DELETE FROM persons WHERE id = ?1 AND version = ?2",
    rusqlite::params![id, version],
  )
}

/// Like [`delete_row`], but only while the row is still the latest version.
fn delete_latest_row(
  conn:    &rusqlite::Connection,
  id:      &str,
  version: u32,
) -> rusqlite::Result<usize> {
  conn.execute(
    "DELETE FROM persons WHERE id = ?1 AND version = ?2 AND is_latest = 1",
    rusqlite::params![id, version],
  )
}

/// Outcome of the `delete_latest` transaction before row decoding.
enum RawDeletion {
  Missing,
  Stale,
  Emptied,
  Promoted(RawPerson),
  PromotionFailed,
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = crate::Error;

  // ── Primitive writes ──────────────────────────────────────────────────────

  async fn insert(
    &self,
    person:    NewPerson,
    identity:  Uuid,
    version:   u32,
    is_latest: bool,
  ) -> Result<i64> {
    person.validate()?;
    let row = RowInsert::new(identity, person, version, is_latest);

    let record = self
      .conn
      .call(move |conn| Ok(insert_row(conn, &row)?))
      .await?;
    Ok(record)
  }

  async fn set_latest_flag(
    &self,
    identity: Uuid,
    version:  u32,
    value:    bool,
  ) -> Result<Option<PersonRecord>> {
    let id_str = encode_uuid(identity);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        if write_flag(conn, &id_str, version, None, value)? == 0 {
          return Ok(None);
        }
        Ok(select_row(conn, &id_str, Some(version))?)
      })
      .await?;

    raw.map(RawPerson::into_record).transpose()
  }

  async fn delete(&self, identity: Uuid, version: u32) -> Result<bool> {
    let id_str = encode_uuid(identity);

    let removed = self
      .conn
      .call(move |conn| Ok(delete_row(conn, &id_str, version)?))
      .await?;
    Ok(removed > 0)
  }

  // ── Atomic compound writes ────────────────────────────────────────────────

  async fn supersede(
    &self,
    identity:        Uuid,
    current_version: u32,
    next:            NewPerson,
  ) -> Result<Option<PersonRecord>> {
    next.validate()?;
    let next_version = current_version + 1;
    let row = RowInsert::new(identity, next, next_version, true);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping `tx` without commit rolls back.
        if write_flag(&tx, &row.id, current_version, Some(true), false)? == 0 {
          return Ok(None);
        }
        insert_row(&tx, &row)?;
        let stored = select_row(&tx, &row.id, Some(next_version))?;

        tx.commit()?;
        Ok(stored)
      })
      .await?;

    raw.map(RawPerson::into_record).transpose()
  }

  async fn delete_latest(&self, identity: Uuid, version: u32) -> Result<Deletion> {
    let id_str = encode_uuid(identity);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if delete_latest_row(&tx, &id_str, version)? == 0 {
          return Ok(match select_row(&tx, &id_str, Some(version))? {
            Some(_) => RawDeletion::Stale,
            None => RawDeletion::Missing,
          });
        }
        if version == 1 {
          tx.commit()?;
          return Ok(RawDeletion::Emptied);
        }

        let previous = version - 1;
        if write_flag(&tx, &id_str, previous, None, true)? == 0 {
          tx.rollback()?;
          return Ok(RawDeletion::PromotionFailed);
        }
        let promoted = select_row(&tx, &id_str, Some(previous))?;

        tx.commit()?;
        Ok(match promoted {
          Some(p) => RawDeletion::Promoted(p),
          None => RawDeletion::PromotionFailed,
        })
      })
      .await?;

    Ok(match raw {
      RawDeletion::Missing => Deletion::Missing,
      RawDeletion::Stale => Deletion::Stale,
      RawDeletion::Emptied => Deletion::Emptied,
      RawDeletion::Promoted(p) => Deletion::Promoted(p.into_record()?),
      RawDeletion::PromotionFailed => {
        tracing::debug!(%identity, version, "promotion found no predecessor");
        Deletion::PromotionFailed
      }
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, identity: Uuid, version: Option<u32>) -> Result<Option<PersonRecord>> {
    let id_str = encode_uuid(identity);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| Ok(select_row(conn, &id_str, version)?))
      .await?;

    raw.map(RawPerson::into_record).transpose()
  }

  async fn latest_version(&self, identity: Uuid) -> Result<Option<u32>> {
    let id_str = encode_uuid(identity);

    let version: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT MAX(version) FROM persons WHERE id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await?;
    version.map(|v| narrow("version", v)).transpose()
  }

  async fn list_all(&self) -> Result<Vec<PersonRecord>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY record"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_record).collect()
  }
}
