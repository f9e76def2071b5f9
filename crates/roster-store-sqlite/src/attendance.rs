//! Class sessions and presence records.

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;

use roster_core::{
  Error as CoreError,
  attendance::{
    AttendanceRoll, ClassSession, NewSession, PresenceInput, PresenceRecord,
    RosterEntry, SessionPatch, SessionSlot, UpsertSummary,
  },
  catalog::Class,
  enrollment::EnrollmentStatus,
  schedule::{YearMonth, parse_weekday, session_dates},
};

use crate::{
  Result,
  encode::{
    CLASS_COLUMNS, RawClass, RawSession, SESSION_COLUMNS, encode_date,
    encode_dt, presence_from_row,
  },
  error::on_unique,
};

// ─── Lookups ─────────────────────────────────────────────────────────────────

fn load_class(conn: &Connection, class_id: i64) -> Result<Class> {
  let raw = conn
    .query_row(
      &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE class_id = ?1"),
      [class_id],
      RawClass::from_row,
    )
    .optional()?;
  match raw {
    Some(raw) => raw.into_class(),
    None => Err(CoreError::ClassNotFound(class_id).into()),
  }
}

fn load_session(conn: &Connection, session_id: i64) -> Result<ClassSession> {
  let raw = conn
    .query_row(
      &format!("SELECT {SESSION_COLUMNS} FROM class_sessions WHERE session_id = ?1"),
      [session_id],
      RawSession::from_row,
    )
    .optional()?;
  match raw {
    Some(raw) => raw.into_session(),
    None => Err(CoreError::SessionNotFound(session_id).into()),
  }
}

fn require_session(conn: &Connection, session_id: i64) -> Result<()> {
  let exists: bool = conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM class_sessions WHERE session_id = ?1)",
    [session_id],
    |r| r.get(0),
  )?;
  if exists { Ok(()) } else { Err(CoreError::SessionNotFound(session_id).into()) }
}

fn check_term(class: &Class, date: NaiveDate) -> Result<()> {
  if class.term_contains(date) {
    Ok(())
  } else {
    Err(CoreError::OutsideTerm { class_id: class.class_id, date }.into())
  }
}

// ─── Roll ────────────────────────────────────────────────────────────────────

/// Materialise the month's sessions and read back the grid.
///
/// Dates outside the class term are skipped. Sessions are inserted with
/// `ON CONFLICT DO NOTHING`, so repeated calls converge on the same rows.
pub(crate) fn roll(
  conn: &Connection,
  class_id: i64,
  month: YearMonth,
  acting_user: i64,
) -> Result<AttendanceRoll> {
  let class = load_class(conn, class_id)?;
  let weekday = parse_weekday(&class.details.weekday)?;
  let now = encode_dt(Utc::now());

  let mut created = 0;
  let mut sessions = Vec::new();
  for date in session_dates(month, weekday).filter(|d| class.term_contains(*d)) {
    let day = encode_date(date);
    created += conn.execute(
      "INSERT INTO class_sessions (class_id, session_date, recorded_by, created_at)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (class_id, session_date) DO NOTHING",
      params![class_id, day, acting_user, now],
    )?;
    let session_id: i64 = conn.query_row(
      "SELECT session_id FROM class_sessions WHERE class_id = ?1 AND session_date = ?2",
      params![class_id, day],
      |r| r.get(0),
    )?;
    sessions.push(SessionSlot { session_id, date });
  }

  let mut stmt = conn.prepare(
    "SELECT s.student_id, s.full_name
       FROM enrollments e
       JOIN students s ON s.student_id = e.student_id
      WHERE e.class_id = ?1 AND e.status = ?2 AND s.active = 1
      ORDER BY s.full_name, s.student_id",
  )?;
  let roster = stmt
    .query_map(params![class_id, EnrollmentStatus::Active.as_str()], |r| {
      Ok(RosterEntry { student_id: r.get(0)?, full_name: r.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT p.presence_id, p.session_id, p.student_id, p.mark, p.note
       FROM presences p
       JOIN class_sessions cs ON cs.session_id = p.session_id
      WHERE cs.class_id = ?1 AND cs.session_date BETWEEN ?2 AND ?3",
  )?;
  let records = stmt
    .query_map(
      params![
        class_id,
        encode_date(month.first_day()),
        encode_date(month.last_day())
      ],
      presence_from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  debug!(class_id, %month, created, students = roster.len(), "roll assembled");
  Ok(AttendanceRoll::assemble(class_id, month, sessions, roster, records, created))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub(crate) fn create_session(
  conn: &Connection,
  input: &NewSession,
  acting_user: i64,
) -> Result<ClassSession> {
  let class = load_class(conn, input.class_id)?;
  check_term(&class, input.session_date)?;
  conn
    .execute(
      "INSERT INTO class_sessions (class_id, session_date, recorded_by, created_at)
       VALUES (?1, ?2, ?3, ?4)",
      params![
        input.class_id,
        encode_date(input.session_date),
        acting_user,
        encode_dt(Utc::now())
      ],
    )
    .map_err(|e| {
      on_unique(e, || CoreError::DuplicateSession {
        class_id: input.class_id,
        date:     input.session_date,
      })
    })?;
  load_session(conn, conn.last_insert_rowid())
}

pub(crate) fn list_sessions(conn: &Connection, class_id: i64) -> Result<Vec<ClassSession>> {
  load_class(conn, class_id)?;
  let mut stmt = conn.prepare(&format!(
    "SELECT {SESSION_COLUMNS} FROM class_sessions
      WHERE class_id = ?1
      ORDER BY session_date DESC, session_id DESC"
  ))?;
  let raws = stmt
    .query_map([class_id], RawSession::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawSession::into_session).collect()
}

pub(crate) fn update_session(
  conn: &Connection,
  session_id: i64,
  patch: &SessionPatch,
) -> Result<ClassSession> {
  let current = load_session(conn, session_id)?;
  let class_id = patch.class_id.unwrap_or(current.class_id);
  let date = patch.session_date.unwrap_or(current.session_date);
  let recorded_by = patch.recorded_by.unwrap_or(current.recorded_by);

  if class_id != current.class_id || date != current.session_date {
    let class = load_class(conn, class_id)?;
    check_term(&class, date)?;
  }

  conn
    .execute(
      "UPDATE class_sessions
          SET class_id = ?2, session_date = ?3, recorded_by = ?4
        WHERE session_id = ?1",
      params![session_id, class_id, encode_date(date), recorded_by],
    )
    .map_err(|e| on_unique(e, || CoreError::DuplicateSession { class_id, date }))?;
  load_session(conn, session_id)
}

// ─── Presences ───────────────────────────────────────────────────────────────

pub(crate) fn presences(conn: &Connection, session_id: i64) -> Result<Vec<PresenceRecord>> {
  require_session(conn, session_id)?;
  let mut stmt = conn.prepare(
    "SELECT p.presence_id, p.session_id, p.student_id, p.mark, p.note
       FROM presences p
       JOIN students s ON s.student_id = p.student_id
      WHERE p.session_id = ?1
      ORDER BY s.full_name, p.student_id",
  )?;
  let rows = stmt
    .query_map([session_id], presence_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Look up each `(session, student)` pair and update it in place, or insert
/// it. Only active students may receive a mark.
pub(crate) fn upsert_presences(
  conn: &Connection,
  session_id: i64,
  records: &[PresenceInput],
) -> Result<UpsertSummary> {
  require_session(conn, session_id)?;
  let now = encode_dt(Utc::now());
  let mut summary = UpsertSummary::default();

  for rec in records {
    let active: Option<bool> = conn
      .query_row(
        "SELECT active FROM students WHERE student_id = ?1",
        [rec.student_id],
        |r| r.get(0),
      )
      .optional()?;
    if active != Some(true) {
      return Err(CoreError::StudentInactive(rec.student_id).into());
    }

    let existing: Option<i64> = conn
      .query_row(
        "SELECT presence_id FROM presences WHERE session_id = ?1 AND student_id = ?2",
        params![session_id, rec.student_id],
        |r| r.get(0),
      )
      .optional()?;

    match existing {
      Some(presence_id) => {
        conn.execute(
          "UPDATE presences SET mark = ?2, note = ?3, recorded_at = ?4
            WHERE presence_id = ?1",
          params![presence_id, rec.stored_mark(), rec.stored_note(), now],
        )?;
        summary.updated += 1;
      }
      None => {
        conn.execute(
          "INSERT INTO presences (session_id, student_id, mark, note, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![session_id, rec.student_id, rec.stored_mark(), rec.stored_note(), now],
        )?;
        summary.inserted += 1;
      }
    }
  }
  Ok(summary)
}

pub(crate) fn delete_presences(conn: &Connection, session_id: i64) -> Result<usize> {
  require_session(conn, session_id)?;
  Ok(conn.execute("DELETE FROM presences WHERE session_id = ?1", [session_id])?)
}
