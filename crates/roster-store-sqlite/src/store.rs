//! [`SqliteStore`], the SQLite implementation of [`SchoolStore`].

use std::path::Path;

use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info};

use roster_core::{
  Error as CoreError,
  attachment::{Attachment, AttachmentOwner, DocumentInput},
  attendance::{
    AttendanceRoll, ClassSession, NewSession, PresenceInput, PresenceRecord,
    SessionPatch, UpsertSummary,
  },
  catalog::{Class, Course, CourseOption, NewClass, NewCourse, StartWindow},
  enrollment::{Cancellation, EnrollmentDetail, EnrollmentReceipt, NewEnrollment},
  schedule::YearMonth,
  search::{StudentFilter, StudentSummary, group_rows},
  store::SchoolStore,
  student::{SchoolShift, normalize_cpf},
};

use crate::{
  Error, Result, attendance,
  encode::{encode_date, encode_time},
  enrollment, schema::SCHEMA, search,
};

// ─── Transactions ────────────────────────────────────────────────────────────

/// Run `f` inside a transaction. Commits on `Ok`; on `Err` the transaction is
/// dropped, which rolls it back.
fn in_transaction<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction()?;
  let out = f(&tx)?;
  tx.commit()?;
  Ok(out)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A school database backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
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

  /// Run `f` in a transaction on the database thread.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(in_transaction(conn, f))).await?
  }

  /// Run `f` on the database thread without a transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  // ── Catalog seeding ───────────────────────────────────────────────────

  /// Insert a course with all seats available.
  pub async fn add_course(&self, input: NewCourse) -> Result<Course> {
    let course = self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO courses (name, total_seats, available_seats, active)
           VALUES (?1, ?2, ?2, 1)",
          params![input.name, input.total_seats],
        )?;
        Ok(Course {
          course_id:       tx.last_insert_rowid(),
          name:            input.name,
          total_seats:     input.total_seats,
          available_seats: input.total_seats,
          active:          true,
        })
      })
      .await?;
    info!(course_id = course.course_id, name = %course.name, "course added");
    Ok(course)
  }

  /// Insert a class under an existing course.
  pub async fn add_class(&self, input: NewClass) -> Result<Class> {
    let class = self
      .write(move |tx| {
        let exists: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM courses WHERE course_id = ?1)",
          [input.course_id],
          |r| r.get(0),
        )?;
        if !exists {
          return Err(CoreError::CourseNotFound(input.course_id).into());
        }
        tx.execute(
          "INSERT INTO classes (
             course_id, name, weekday, start_time, end_time,
             term_start, term_end, seats, description
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            input.course_id,
            input.name,
            input.weekday,
            encode_time(input.start_time),
            encode_time(input.end_time),
            input.term_start.map(encode_date),
            input.term_end.map(encode_date),
            input.seats,
            input.description,
          ],
        )?;
        Ok(Class { class_id: tx.last_insert_rowid(), details: input })
      })
      .await?;
    info!(class_id = class.class_id, course_id = class.details.course_id, "class added");
    Ok(class)
  }

  /// Current seat counters of a course.
  pub async fn course(&self, course_id: i64) -> Result<Course> {
    self
      .read(move |conn| {
        conn
          .query_row(
            "SELECT course_id, name, total_seats, available_seats, active
               FROM courses WHERE course_id = ?1",
            [course_id],
            |r| {
              Ok(Course {
                course_id:       r.get(0)?,
                name:            r.get(1)?,
                total_seats:     r.get(2)?,
                available_seats: r.get(3)?,
                active:          r.get(4)?,
              })
            },
          )
          .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
              CoreError::CourseNotFound(course_id).into()
            }
            other => Error::from(other),
          })
      })
      .await
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Number of rows in `table`.
  pub(crate) async fn row_count(&self, table: &'static str) -> i64 {
    self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await
      .expect("row count")
  }
}

// ─── SchoolStore impl ────────────────────────────────────────────────────────

impl SchoolStore for SqliteStore {
  type Error = Error;

  // ── Enrollment ────────────────────────────────────────────────────────

  async fn create_enrollment(&self, input: NewEnrollment) -> Result<EnrollmentReceipt> {
    let input = input.validated()?;
    let receipt = self
      .write(move |tx| enrollment::create(tx, &input))
      .await
      .inspect_err(|e| debug!(error = %e, "enrollment rolled back"))?;
    info!(
      student_id = receipt.student_id,
      enrollments = receipt.enrollment_ids.len(),
      "enrollment created"
    );
    Ok(receipt)
  }

  async fn get_enrollment(&self, student_id: i64) -> Result<Option<EnrollmentDetail>> {
    self.read(move |conn| enrollment::detail(conn, student_id)).await
  }

  async fn update_enrollment(
    &self,
    student_id: i64,
    input: NewEnrollment,
  ) -> Result<EnrollmentReceipt> {
    let input = input.validated()?;
    let receipt = self
      .write(move |tx| enrollment::update(tx, student_id, &input))
      .await
      .inspect_err(|e| debug!(student_id, error = %e, "enrollment update rolled back"))?;
    info!(
      student_id,
      enrollments = receipt.enrollment_ids.len(),
      "enrollment updated"
    );
    Ok(receipt)
  }

  async fn cancel_enrollment(&self, student_id: i64) -> Result<Cancellation> {
    let cancellation = self
      .write(move |tx| enrollment::cancel(tx, student_id))
      .await?;
    info!(
      student_id,
      released = cancellation.released_classes.len(),
      "enrollment cancelled"
    );
    Ok(cancellation)
  }

  async fn cpf_exists(&self, cpf: &str) -> Result<bool> {
    let cpf = normalize_cpf(cpf)?;
    self.read(move |conn| enrollment::cpf_exists(conn, &cpf)).await
  }

  async fn search_students(&self, filter: &StudentFilter) -> Result<Vec<StudentSummary>> {
    let today = search::today();
    let clauses = filter.clauses(today);
    let rows = self.read(move |conn| search::query(conn, &clauses)).await?;
    let summaries = group_rows(rows, today);
    debug!(results = summaries.len(), "student search");
    Ok(summaries)
  }

  async fn available_courses(&self, shift: Option<SchoolShift>) -> Result<Vec<CourseOption>> {
    let window = StartWindow::for_shift(shift);
    if window == StartWindow::Nothing {
      debug!(?shift, "no class window for school shift");
      return Ok(Vec::new());
    }
    self
      .read(move |conn| enrollment::available_courses(conn, window))
      .await
  }

  async fn attach_documents(
    &self,
    owner: AttachmentOwner,
    documents: Vec<DocumentInput>,
  ) -> Result<Vec<Attachment>> {
    if documents.is_empty() {
      return Ok(Vec::new());
    }
    let attached = self
      .write(move |tx| enrollment::attach(tx, owner, &documents))
      .await?;
    info!(
      entity_type = owner.entity_type,
      entity_id = owner.entity_id,
      count = attached.len(),
      "documents attached"
    );
    Ok(attached)
  }

  // ── Attendance ────────────────────────────────────────────────────────

  async fn attendance_roll(
    &self,
    class_id: i64,
    month: YearMonth,
    acting_user: i64,
  ) -> Result<AttendanceRoll> {
    let roll = self
      .write(move |tx| attendance::roll(tx, class_id, month, acting_user))
      .await?;
    if roll.created > 0 {
      info!(class_id, %month, created = roll.created, "sessions materialised");
    }
    Ok(roll)
  }

  async fn create_session(&self, input: NewSession, acting_user: i64) -> Result<ClassSession> {
    let session = self
      .write(move |tx| attendance::create_session(tx, &input, acting_user))
      .await?;
    info!(
      session_id = session.session_id,
      class_id = session.class_id,
      date = %session.session_date,
      "session created"
    );
    Ok(session)
  }

  async fn list_sessions(&self, class_id: i64) -> Result<Vec<ClassSession>> {
    self.read(move |conn| attendance::list_sessions(conn, class_id)).await
  }

  async fn update_session(&self, session_id: i64, patch: SessionPatch) -> Result<ClassSession> {
    let session = self
      .write(move |tx| attendance::update_session(tx, session_id, &patch))
      .await?;
    info!(session_id, "session updated");
    Ok(session)
  }

  async fn get_presences(&self, session_id: i64) -> Result<Vec<PresenceRecord>> {
    self.read(move |conn| attendance::presences(conn, session_id)).await
  }

  async fn upsert_presences(
    &self,
    session_id: i64,
    records: Vec<PresenceInput>,
  ) -> Result<UpsertSummary> {
    let summary = self
      .write(move |tx| attendance::upsert_presences(tx, session_id, &records))
      .await
      .inspect_err(|e| debug!(session_id, error = %e, "presence upsert rolled back"))?;
    info!(
      session_id,
      inserted = summary.inserted,
      updated = summary.updated,
      "presences saved"
    );
    Ok(summary)
  }

  async fn delete_presences(&self, session_id: i64) -> Result<usize> {
    let deleted = self
      .write(move |tx| attendance::delete_presences(tx, session_id))
      .await?;
    info!(session_id, deleted, "presences deleted");
    Ok(deleted)
  }
}
