//! The `SchoolStore` trait.
//!
//! Implemented by storage backends (e.g. `roster-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  attachment::{Attachment, AttachmentOwner, DocumentInput},
  attendance::{
    AttendanceRoll, ClassSession, NewSession, PresenceInput, PresenceRecord,
    SessionPatch, UpsertSummary,
  },
  catalog::CourseOption,
  enrollment::{Cancellation, EnrollmentDetail, EnrollmentReceipt, NewEnrollment},
  error::Classify,
  schedule::YearMonth,
  search::{StudentFilter, StudentSummary},
  student::SchoolShift,
};

/// Abstraction over the school database.
///
/// Every mutating method runs as a single transaction: it either commits in
/// full or leaves no trace. Reads run without one.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SchoolStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Enrollment ────────────────────────────────────────────────────────

  /// Register a new student with guardians and the requested classes,
  /// charging one seat per class to the owning course.
  fn create_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<EnrollmentReceipt, Self::Error>> + Send + '_;

  /// Returns `None` if the student does not exist.
  fn get_enrollment(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<EnrollmentDetail>, Self::Error>> + Send + '_;

  /// Replace the student's profile, guardian links and active class set.
  /// Seats of the old set are released before the new set is charged.
  fn update_enrollment(
    &self,
    student_id: i64,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<EnrollmentReceipt, Self::Error>> + Send + '_;

  /// Deactivate the student, cancel every active enrollment and release one
  /// seat per cancelled enrollment.
  fn cancel_enrollment(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Cancellation, Self::Error>> + Send + '_;

  /// Whether a student with this CPF is already registered.
  fn cpf_exists<'a>(
    &'a self,
    cpf: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn search_students<'a>(
    &'a self,
    filter: &'a StudentFilter,
  ) -> impl Future<Output = Result<Vec<StudentSummary>, Self::Error>> + Send + 'a;

  /// Active courses with seats left, restricted to classes that fit around
  /// the given school shift.
  fn available_courses(
    &self,
    shift: Option<SchoolShift>,
  ) -> impl Future<Output = Result<Vec<CourseOption>, Self::Error>> + Send + '_;

  /// Record attachment metadata. Runs outside any enrollment transaction.
  fn attach_documents(
    &self,
    owner: AttachmentOwner,
    documents: Vec<DocumentInput>,
  ) -> impl Future<Output = Result<Vec<Attachment>, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Build the attendance roll of a class for a month, creating any missing
  /// session on the way. Mutating: the first call for a month inserts
  /// sessions attributed to `acting_user`, later calls converge on them.
  fn attendance_roll(
    &self,
    class_id: i64,
    month: YearMonth,
    acting_user: i64,
  ) -> impl Future<Output = Result<AttendanceRoll, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    input: NewSession,
    acting_user: i64,
  ) -> impl Future<Output = Result<ClassSession, Self::Error>> + Send + '_;

  /// Sessions of a class, newest first.
  fn list_sessions(
    &self,
    class_id: i64,
  ) -> impl Future<Output = Result<Vec<ClassSession>, Self::Error>> + Send + '_;

  fn update_session(
    &self,
    session_id: i64,
    patch: SessionPatch,
  ) -> impl Future<Output = Result<ClassSession, Self::Error>> + Send + '_;

  fn get_presences(
    &self,
    session_id: i64,
  ) -> impl Future<Output = Result<Vec<PresenceRecord>, Self::Error>> + Send + '_;

  /// Insert or update one presence per student for the session.
  fn upsert_presences(
    &self,
    session_id: i64,
    records: Vec<PresenceInput>,
  ) -> impl Future<Output = Result<UpsertSummary, Self::Error>> + Send + '_;

  /// Delete every presence of the session. Returns how many were removed.
  fn delete_presences(
    &self,
    session_id: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
