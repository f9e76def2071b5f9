//! Seat accounting for courses.
//!
//! Both operations are single relative `UPDATE`s executed on the caller's
//! transaction. Nothing here reads a counter into application code.

use rusqlite::Connection;
use tracing::debug;

use crate::Result;

/// Charge one seat to `course_id`. Fails with `NoSeatsAvailable` when the
/// course is full and `CourseNotFound` when it does not exist.
pub(crate) fn take_seat(conn: &Connection, course_id: i64) -> Result<()> {
  let changed = conn.execute(
    "UPDATE courses
        SET available_seats = available_seats - 1
      WHERE course_id = ?1 AND available_seats > 0",
    [course_id],
  )?;
  if changed == 1 {
    return Ok(());
  }
  let exists = conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM courses WHERE course_id = ?1)",
    [course_id],
    |r| r.get::<_, bool>(0),
  )?;
  if exists {
    Err(roster_core::Error::NoSeatsAvailable(course_id).into())
  } else {
    Err(roster_core::Error::CourseNotFound(course_id).into())
  }
}

/// Give one seat back to `course_id`, never exceeding `total_seats`.
pub(crate) fn release_seat(conn: &Connection, course_id: i64) -> Result<()> {
  let changed = conn.execute(
    "UPDATE courses
        SET available_seats = MIN(total_seats, available_seats + 1)
      WHERE course_id = ?1",
    [course_id],
  )?;
  if changed == 0 {
    debug!(course_id, "seat release matched no course");
  }
  Ok(())
}
