//! Enrollment transactions: student, guardians, class seats.
//!
//! Every function takes the caller's connection or transaction and issues
//! plain statements on it. The async entry points in `store` wrap them in a
//! single transaction so a failure at any step rolls back all of them.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;

use roster_core::{
  Error as CoreError,
  attachment::{Attachment, AttachmentOwner, DocumentInput},
  catalog::{CourseOption, StartWindow},
  enrollment::{
    Cancellation, ClassChoice, EnrollmentDetail, EnrollmentReceipt,
    EnrollmentStatus, NewEnrollment,
  },
  student::{GuardianInput, GuardianLinkKind, StudentProfile},
};

use crate::{
  Result,
  encode::{
    RawAttachment, RawClass, RawEnrollment, RawGuardian,
    RawStudent, STUDENT_COLUMNS, encode_date, encode_dt, encode_link,
  },
  error::on_unique,
  ledger::{release_seat, take_seat},
};

const ACTIVE: &str = EnrollmentStatus::Active.as_str();
const CANCELLED: &str = EnrollmentStatus::Cancelled.as_str();

// ─── Students ────────────────────────────────────────────────────────────────

fn insert_student(
  conn: &Connection,
  p: &StudentProfile,
  now: DateTime<Utc>,
) -> Result<i64> {
  conn
    .execute(
      "INSERT INTO students (
         full_name, cpf, birth_date, gender, phone, zip_code, street,
         house_number, neighborhood, current_school, grade, school_shift,
         notes, enrolled_at, active
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 1)",
      params![
        p.full_name,
        p.cpf,
        p.birth_date.map(encode_date),
        p.gender,
        p.phone,
        p.zip_code,
        p.street,
        p.house_number,
        p.neighborhood,
        p.current_school,
        p.grade,
        p.school_shift.map(|s| s.as_str()),
        p.notes,
        encode_dt(now),
      ],
    )
    .map_err(|e| on_unique(e, || CoreError::DuplicateCpf(p.cpf.clone())))?;
  Ok(conn.last_insert_rowid())
}

/// Overwrite the profile and reactivate the student. The CPF column is left
/// alone; callers have already checked it did not change.
fn update_student(conn: &Connection, student_id: i64, p: &StudentProfile) -> Result<()> {
  conn.execute(
    "UPDATE students SET
       full_name = ?2, birth_date = ?3, gender = ?4, phone = ?5, zip_code = ?6,
       street = ?7, house_number = ?8, neighborhood = ?9, current_school = ?10,
       grade = ?11, school_shift = ?12, notes = ?13, active = 1
     WHERE student_id = ?1",
    params![
      student_id,
      p.full_name,
      p.birth_date.map(encode_date),
      p.gender,
      p.phone,
      p.zip_code,
      p.street,
      p.house_number,
      p.neighborhood,
      p.current_school,
      p.grade,
      p.school_shift.map(|s| s.as_str()),
      p.notes,
    ],
  )?;
  Ok(())
}

fn student_cpf(conn: &Connection, student_id: i64) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT cpf FROM students WHERE student_id = ?1",
        [student_id],
        |r| r.get(0),
      )
      .optional()?,
  )
}

// ─── Guardians ───────────────────────────────────────────────────────────────

/// Find the guardian by CPF and refresh their details, or insert them.
fn upsert_guardian(conn: &Connection, g: &GuardianInput) -> Result<i64> {
  let existing: Option<i64> = conn
    .query_row(
      "SELECT guardian_id FROM guardians WHERE cpf = ?1",
      [&g.cpf],
      |r| r.get(0),
    )
    .optional()?;

  match existing {
    Some(id) => {
      conn.execute(
        "UPDATE guardians SET
           full_name = ?2, relationship = ?3, phone = ?4, phone_contact = ?5,
           message_phone1 = ?6, message_phone1_contact = ?7,
           message_phone2 = ?8, message_phone2_contact = ?9
         WHERE guardian_id = ?1",
        params![
          id,
          g.full_name,
          g.relationship,
          g.phone,
          g.phone_contact,
          g.message_phone1,
          g.message_phone1_contact,
          g.message_phone2,
          g.message_phone2_contact,
        ],
      )?;
      Ok(id)
    }
    None => {
      conn.execute(
        "INSERT INTO guardians (
           full_name, cpf, relationship, phone, phone_contact,
           message_phone1, message_phone1_contact,
           message_phone2, message_phone2_contact
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
          g.full_name,
          g.cpf,
          g.relationship,
          g.phone,
          g.phone_contact,
          g.message_phone1,
          g.message_phone1_contact,
          g.message_phone2,
          g.message_phone2_contact,
        ],
      )?;
      Ok(conn.last_insert_rowid())
    }
  }
}

fn link_guardians(conn: &Connection, student_id: i64, guardians: &[GuardianInput]) -> Result<()> {
  for g in guardians {
    let guardian_id = upsert_guardian(conn, g)?;
    conn.execute(
      "INSERT OR REPLACE INTO guardian_links (student_id, guardian_id, link)
       VALUES (?1, ?2, ?3)",
      params![student_id, guardian_id, encode_link(GuardianLinkKind::for_input(g))],
    )?;
  }
  Ok(())
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

/// Insert one ACTIVE enrollment per choice and charge a seat for each.
fn enroll_classes(
  conn: &Connection,
  student_id: i64,
  choices: &[ClassChoice],
  now: DateTime<Utc>,
) -> Result<Vec<i64>> {
  let now = encode_dt(now);
  let mut ids = Vec::with_capacity(choices.len());
  for c in choices {
    let owner: Option<i64> = conn
      .query_row(
        "SELECT course_id FROM classes WHERE class_id = ?1",
        [c.class_id],
        |r| r.get(0),
      )
      .optional()?;
    match owner {
      None => return Err(CoreError::ClassNotFound(c.class_id).into()),
      Some(course_id) if course_id != c.course_id => {
        return Err(
          CoreError::ClassCourseMismatch { class_id: c.class_id, course_id: c.course_id }
            .into(),
        );
      }
      Some(_) => {}
    }

    conn
      .execute(
        "INSERT INTO enrollments (student_id, class_id, course_id, status, enrolled_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![student_id, c.class_id, c.course_id, ACTIVE, now],
      )
      .map_err(|e| {
        on_unique(e, || CoreError::AlreadyEnrolled { student_id, class_id: c.class_id })
      })?;
    ids.push(conn.last_insert_rowid());
    take_seat(conn, c.course_id)?;
  }
  Ok(ids)
}

/// `(class_id, course_id)` of every ACTIVE enrollment of the student.
fn active_enrollments(conn: &Connection, student_id: i64) -> Result<Vec<(i64, i64)>> {
  let mut stmt = conn.prepare(
    "SELECT class_id, course_id FROM enrollments
      WHERE student_id = ?1 AND status = ?2
      ORDER BY enrollment_id",
  )?;
  let rows = stmt
    .query_map(params![student_id, ACTIVE], |r| Ok((r.get(0)?, r.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Transactions ────────────────────────────────────────────────────────────

pub(crate) fn create(conn: &Connection, input: &NewEnrollment) -> Result<EnrollmentReceipt> {
  let now = Utc::now();
  let student_id = insert_student(conn, &input.student, now)?;
  link_guardians(conn, student_id, &input.guardians)?;
  let enrollment_ids = enroll_classes(conn, student_id, &input.classes, now)?;
  Ok(EnrollmentReceipt { student_id, enrollment_ids })
}

pub(crate) fn update(
  conn: &Connection,
  student_id: i64,
  input: &NewEnrollment,
) -> Result<EnrollmentReceipt> {
  let Some(cpf) = student_cpf(conn, student_id)? else {
    return Err(CoreError::StudentNotFound(student_id).into());
  };
  if cpf != input.student.cpf {
    return Err(CoreError::Validation("CPF cannot be changed".into()).into());
  }

  update_student(conn, student_id, &input.student)?;

  conn.execute("DELETE FROM guardian_links WHERE student_id = ?1", [student_id])?;
  link_guardians(conn, student_id, &input.guardians)?;

  let previous = active_enrollments(conn, student_id)?;
  for (_, course_id) in &previous {
    release_seat(conn, *course_id)?;
  }
  conn.execute(
    "DELETE FROM enrollments WHERE student_id = ?1 AND status = ?2",
    params![student_id, ACTIVE],
  )?;
  debug!(student_id, released = previous.len(), "previous class set removed");

  let enrollment_ids = enroll_classes(conn, student_id, &input.classes, Utc::now())?;
  Ok(EnrollmentReceipt { student_id, enrollment_ids })
}

pub(crate) fn cancel(conn: &Connection, student_id: i64) -> Result<Cancellation> {
  let touched = conn.execute(
    "UPDATE students SET active = 0 WHERE student_id = ?1",
    [student_id],
  )?;
  if touched == 0 {
    return Err(CoreError::StudentNotFound(student_id).into());
  }

  let active = active_enrollments(conn, student_id)?;
  for (_, course_id) in &active {
    release_seat(conn, *course_id)?;
  }
  conn.execute(
    "UPDATE enrollments SET status = ?3, updated_at = ?4
      WHERE student_id = ?1 AND status = ?2",
    params![student_id, ACTIVE, CANCELLED, encode_dt(Utc::now())],
  )?;

  Ok(Cancellation {
    student_id,
    released_classes: active.into_iter().map(|(class_id, _)| class_id).collect(),
  })
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub(crate) fn detail(conn: &Connection, student_id: i64) -> Result<Option<EnrollmentDetail>> {
  let raw = conn
    .query_row(
      &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
      [student_id],
      RawStudent::from_row,
    )
    .optional()?;
  let Some(raw) = raw else { return Ok(None) };
  let student = raw.into_student()?;

  let mut stmt = conn.prepare(
    "SELECT g.guardian_id, g.full_name, g.cpf, g.relationship, g.phone,
            g.phone_contact, g.message_phone1, g.message_phone1_contact,
            g.message_phone2, g.message_phone2_contact, l.link
       FROM guardian_links l
       JOIN guardians g ON g.guardian_id = l.guardian_id
      WHERE l.student_id = ?1
      ORDER BY l.link, g.full_name",
  )?;
  let guardians = stmt
    .query_map([student_id], RawGuardian::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawGuardian::into_linked)
    .collect::<Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT e.enrollment_id, e.course_id, co.name, e.class_id, cl.name,
            e.status, e.enrolled_at
       FROM enrollments e
       JOIN courses co ON co.course_id = e.course_id
       JOIN classes cl ON cl.class_id  = e.class_id
      WHERE e.student_id = ?1
      ORDER BY e.enrollment_id",
  )?;
  let enrollments = stmt
    .query_map([student_id], |r| {
      Ok(RawEnrollment {
        enrollment_id: r.get(0)?,
        course_id:     r.get(1)?,
        course_name:   r.get(2)?,
        class_id:      r.get(3)?,
        class_name:    r.get(4)?,
        status:        r.get(5)?,
        enrolled_at:   r.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawEnrollment::into_record)
    .collect::<Result<Vec<_>>>()?;

  let documents = attachments_of(conn, AttachmentOwner::enrollment(student_id))?;

  Ok(Some(EnrollmentDetail { student, guardians, enrollments, documents }))
}

pub(crate) fn cpf_exists(conn: &Connection, cpf: &str) -> Result<bool> {
  Ok(conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM students WHERE cpf = ?1)",
    [cpf],
    |r| r.get(0),
  )?)
}

/// Active courses with seats left, each with the classes inside `window`.
/// Courses without a fitting class are left out.
pub(crate) fn available_courses(conn: &Connection, window: StartWindow) -> Result<Vec<CourseOption>> {
  let time_filter = match window {
    StartWindow::Any => "",
    StartWindow::FromNoon => "AND cl.start_time >= '12:00:00'",
    StartWindow::BeforeNoon => "AND cl.start_time < '12:00:00'",
    StartWindow::Nothing => return Ok(Vec::new()),
  };
  let mut stmt = conn.prepare(&format!(
    "SELECT cl.class_id, cl.course_id, cl.name, cl.weekday, cl.start_time,
            cl.end_time, cl.term_start, cl.term_end, cl.seats, cl.description,
            co.name, co.total_seats, co.available_seats
       FROM courses co
       JOIN classes cl ON cl.course_id = co.course_id
      WHERE co.active = 1 AND co.available_seats > 0 {time_filter}
      ORDER BY co.name, co.course_id, cl.name, cl.class_id"
  ))?;
  let rows = stmt
    .query_map([], |r| {
      Ok((
        RawClass::from_row(r)?,
        r.get::<_, String>(10)?,
        r.get::<_, u32>(11)?,
        r.get::<_, u32>(12)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut out: Vec<CourseOption> = Vec::new();
  for (class, name, total_seats, available_seats) in rows {
    let course_id = class.course_id;
    if out.last().is_none_or(|c| c.course_id != course_id) {
      out.push(CourseOption {
        course_id,
        name,
        total_seats,
        available_seats,
        classes: Vec::new(),
      });
    }
    if let Some(course) = out.last_mut() {
      course.classes.push(class.into_option()?);
    }
  }
  Ok(out)
}

// ─── Attachments ─────────────────────────────────────────────────────────────

pub(crate) fn attach(
  conn: &Connection,
  owner: AttachmentOwner,
  documents: &[DocumentInput],
) -> Result<Vec<Attachment>> {
  let now = encode_dt(Utc::now());
  let mut ids = Vec::with_capacity(documents.len());
  for doc in documents {
    conn.execute(
      "INSERT INTO attachments (entity_type, entity_id, kind, file_name, extension, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        owner.entity_type,
        owner.entity_id,
        doc.kind,
        doc.file_name,
        doc.extension(),
        now
      ],
    )?;
    ids.push(conn.last_insert_rowid());
  }
  let all = attachments_of(conn, owner)?;
  Ok(all.into_iter().filter(|a| ids.contains(&a.attachment_id)).collect())
}

fn attachments_of(conn: &Connection, owner: AttachmentOwner) -> Result<Vec<Attachment>> {
  let mut stmt = conn.prepare(
    "SELECT attachment_id, entity_type, entity_id, kind, file_name, extension, created_at
       FROM attachments
      WHERE entity_type = ?1 AND entity_id = ?2
      ORDER BY attachment_id",
  )?;
  let raws = stmt
    .query_map(params![owner.entity_type, owner.entity_id], RawAttachment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAttachment::into_attachment).collect()
}
