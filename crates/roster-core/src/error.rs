//! Error types for `roster-core`.

use thiserror::Error;

/// Coarse classification shared by every layer. The HTTP layer maps each kind
/// to a status code; nothing else inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Client-supplied data failed a precondition. Nothing was written.
  Validation,
  /// A natural key collided with an existing row.
  Conflict,
  /// A referenced entity does not exist.
  NotFound,
  /// A cross-entity invariant would be violated.
  Consistency,
  /// Unexpected storage failure.
  Persistence,
}

/// Implemented by every error a [`crate::store::SchoolStore`] can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Validation(String),

  #[error("CPF already registered: {0}")]
  DuplicateCpf(String),

  #[error("student {student_id} is already enrolled in class {class_id}")]
  AlreadyEnrolled { student_id: i64, class_id: i64 },

  #[error("session for class {class_id} on {date} already exists")]
  DuplicateSession { class_id: i64, date: chrono::NaiveDate },

  #[error("student not found: {0}")]
  StudentNotFound(i64),

  #[error("course not found: {0}")]
  CourseNotFound(i64),

  #[error("class not found: {0}")]
  ClassNotFound(i64),

  #[error("session not found: {0}")]
  SessionNotFound(i64),

  #[error("student {0} not found or inactive")]
  StudentInactive(i64),

  #[error("no seats available in course {0}")]
  NoSeatsAvailable(i64),

  #[error("class {class_id} does not belong to course {course_id}")]
  ClassCourseMismatch { class_id: i64, course_id: i64 },

  #[error("{date} is outside the term of class {class_id}")]
  OutsideTerm { class_id: i64, date: chrono::NaiveDate },

  #[error("unknown weekday: {0:?}")]
  UnknownWeekday(String),

  #[error("invalid year-month: {0:?}")]
  InvalidYearMonth(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_)
      | Self::UnknownWeekday(_)
      | Self::InvalidYearMonth(_)
      | Self::StudentInactive(_) => ErrorKind::Validation,
      Self::DuplicateCpf(_)
      | Self::AlreadyEnrolled { .. }
      | Self::DuplicateSession { .. } => ErrorKind::Conflict,
      Self::StudentNotFound(_)
      | Self::CourseNotFound(_)
      | Self::ClassNotFound(_)
      | Self::SessionNotFound(_) => ErrorKind::NotFound,
      Self::NoSeatsAvailable(_)
      | Self::ClassCourseMismatch { .. }
      | Self::OutsideTerm { .. } => ErrorKind::Consistency,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
