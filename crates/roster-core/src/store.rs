//! The `PersonStore` trait — the record-store interface.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! [`crate::manager::VersionManager`] depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::person::{NewPerson, PersonRecord};

/// Outcome of [`PersonStore::delete_latest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
  /// No row matched; nothing was changed.
  Missing,
  /// The row exists but is no longer the latest version (another write got
  /// there first); nothing was changed.
  Stale,
  /// Version 1 was deleted; the identity has no rows left.
  Emptied,
  /// The deleted row's predecessor is now the latest version.
  Promoted(PersonRecord),
  /// The predecessor could not be promoted. The deletion was rolled back.
  PromotionFailed,
}

/// Abstraction over the append-only `persons` table.
///
/// Rows are only ever inserted or deleted; `is_latest` is the single mutable
/// column. Absence is reported through `Option`/`bool`, never as an error, so
/// callers decide what a missing row means.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Primitive writes ──────────────────────────────────────────────────

  /// Append a row and return its store-assigned record id.
  ///
  /// Fails if `(identity, version)` already exists or the payload violates
  /// the column constraints.
  fn insert(
    &self,
    person: NewPerson,
    identity: Uuid,
    version: u32,
    is_latest: bool,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Set `is_latest` on the exact `(identity, version)` row and return the
  /// updated row, or `None` if no such row exists.
  fn set_latest_flag(
    &self,
    identity: Uuid,
    version: u32,
    value: bool,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// Remove the exact `(identity, version)` row. Returns `false` if it was
  /// absent.
  fn delete(
    &self,
    identity: Uuid,
    version: u32,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Atomic compound writes ────────────────────────────────────────────

  /// In one transaction: flip `(identity, current_version)` from latest to
  /// not-latest, then append `next` as `current_version + 1` with
  /// `is_latest = true`.
  ///
  /// The flip is conditional on the row still being latest. Returns `None`
  /// and commits nothing if it is not.
  fn supersede(
    &self,
    identity: Uuid,
    current_version: u32,
    next: NewPerson,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// In one transaction: delete `(identity, version)` if it is still the
  /// latest row and, unless it was version 1, promote `version - 1` to latest.
  fn delete_latest(
    &self,
    identity: Uuid,
    version: u32,
  ) -> impl Future<Output = Result<Deletion, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// With `version = None`, the latest row of `identity`; otherwise the exact
  /// `(identity, version)` row.
  fn get(
    &self,
    identity: Uuid,
    version: Option<u32>,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// `max(version)` across every row of `identity`.
  fn latest_version(
    &self,
    identity: Uuid,
  ) -> impl Future<Output = Result<Option<u32>, Self::Error>> + Send + '_;

  /// Every stored row, all identities and all versions, in record order.
  fn list_all(
    &self,
  ) -> impl Future<Output = Result<Vec<PersonRecord>, Self::Error>> + Send + '_;
}
