//! Error types for `roster-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// No row matches the identity (and version, when one was requested).
  #[error("{}", not_found_message(.identity, .version))]
  NotFound {
    identity: Uuid,
    version:  Option<u32>,
  },

  /// Payload fields are missing or malformed.
  #[error("validation error: {0}")]
  Validation(String),

  /// The storage engine rejected a write (duplicate `(identity, version)`,
  /// failed CHECK, second latest row).
  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("no new attributes to update")]
  NoOpUpdate,

  /// The latest-version bookkeeping could not be maintained. Compound writes
  /// are rolled back before this is returned.
  #[error("{0}")]
  Versioning(String),

  /// Infrastructure failure in the backing store; propagated unmodified.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn not_found_message(identity: &Uuid, version: &Option<u32>) -> String {
  match version {
    Some(v) => format!("no version {v} record found for person_id {identity}"),
    None => format!("no record found for person_id {identity}"),
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
