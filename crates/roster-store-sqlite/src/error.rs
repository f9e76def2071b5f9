//! Error type for `roster-store-sqlite`.

use roster_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule rejected the operation. Carries its own classification.
  #[error(transparent)]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held text that no domain value maps to.
  #[error("unexpected value in column {column}: {value:?}")]
  Decode { column: &'static str, value: String },
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      _ => ErrorKind::Persistence,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// `true` if `e` is a UNIQUE or PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Turn a unique violation into `conflict`, anything else into a storage
/// error.
pub(crate) fn on_unique(
  e: rusqlite::Error,
  conflict: impl FnOnce() -> roster_core::Error,
) -> Error {
  if is_unique_violation(&e) { conflict().into() } else { e.into() }
}
