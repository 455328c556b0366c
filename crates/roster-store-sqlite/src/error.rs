//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// SQLite rejected a write with `SQLITE_CONSTRAINT` (UNIQUE, CHECK or
  /// NOT NULL).
  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored integer does not fit the domain type it decodes to.
  #[error("corrupt row: {column} value {value} out of range")]
  Corrupt {
    column: &'static str,
    value:  i64,
  },
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        code,
        msg,
      )) if code.code == rusqlite::ErrorCode::ConstraintViolation => {
        Error::ConstraintViolation(msg.unwrap_or_else(|| code.to_string()))
      }
      other => Error::Database(other),
    }
  }
}

impl From<Error> for roster_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::ConstraintViolation(msg) => {
        roster_core::Error::ConstraintViolation(msg)
      }
      other => roster_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
