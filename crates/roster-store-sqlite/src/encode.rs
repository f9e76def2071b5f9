//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! and times of day as `HH:MM:SS`, so lexicographic order in SQL matches
//! chronological order.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use roster_core::{
  attachment::Attachment,
  attendance::{ClassSession, PresenceRecord},
  catalog::{Class, ClassOption, NewClass},
  enrollment::{EnrollmentRecord, EnrollmentStatus},
  search::StudentRow,
  student::{
    GuardianInput, GuardianLinkKind, LinkedGuardian, SchoolShift, Student,
    StudentProfile, StudentStatus,
  },
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_school_shift(s: Option<String>) -> Result<Option<SchoolShift>> {
  s.map(|s| {
    SchoolShift::parse(&s).ok_or(Error::Decode { column: "school_shift", value: s })
  })
  .transpose()
}

pub fn encode_link(k: GuardianLinkKind) -> &'static str {
  match k {
    GuardianLinkKind::Principal => "principal",
    GuardianLinkKind::Secondary => "secondary",
  }
}

pub fn decode_link(s: &str) -> Result<GuardianLinkKind> {
  match s {
    "principal" => Ok(GuardianLinkKind::Principal),
    "secondary" => Ok(GuardianLinkKind::Secondary),
    other => Err(Error::Decode { column: "link", value: other.to_owned() }),
  }
}

pub fn decode_status(s: &str) -> Result<EnrollmentStatus> {
  EnrollmentStatus::parse(s)
    .ok_or_else(|| Error::Decode { column: "status", value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStudent::from_row`].
pub const STUDENT_COLUMNS: &str = "student_id, full_name, cpf, birth_date, \
   gender, phone, zip_code, street, house_number, neighborhood, \
   current_school, grade, school_shift, notes, enrolled_at, active";

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub student_id:     i64,
  pub full_name:      String,
  pub cpf:            String,
  pub birth_date:     Option<String>,
  pub gender:         Option<String>,
  pub phone:          Option<String>,
  pub zip_code:       Option<String>,
  pub street:         Option<String>,
  pub house_number:   Option<String>,
  pub neighborhood:   Option<String>,
  pub current_school: Option<String>,
  pub grade:          Option<String>,
  pub school_shift:   Option<String>,
  pub notes:          Option<String>,
  pub enrolled_at:    String,
  pub active:         bool,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:     row.get(0)?,
      full_name:      row.get(1)?,
      cpf:            row.get(2)?,
      birth_date:     row.get(3)?,
      gender:         row.get(4)?,
      phone:          row.get(5)?,
      zip_code:       row.get(6)?,
      street:         row.get(7)?,
      house_number:   row.get(8)?,
      neighborhood:   row.get(9)?,
      current_school: row.get(10)?,
      grade:          row.get(11)?,
      school_shift:   row.get(12)?,
      notes:          row.get(13)?,
      enrolled_at:    row.get(14)?,
      active:         row.get(15)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:  self.student_id,
      profile:     StudentProfile {
        full_name:      self.full_name,
        cpf:            self.cpf,
        birth_date:     decode_opt_date(self.birth_date)?,
        gender:         self.gender,
        phone:          self.phone,
        zip_code:       self.zip_code,
        street:         self.street,
        house_number:   self.house_number,
        neighborhood:   self.neighborhood,
        current_school: self.current_school,
        grade:          self.grade,
        school_shift:   decode_school_shift(self.school_shift)?,
        notes:          self.notes,
      },
      enrolled_at: decode_dt(&self.enrolled_at)?,
      status:      StudentStatus::from_active(self.active),
    })
  }
}

/// Raw values of a guardian joined with its link row.
pub struct RawGuardian {
  pub guardian_id: i64,
  pub guardian:    GuardianInput,
  pub link:        String,
}

impl RawGuardian {
  /// Expects `guardian_id, full_name, cpf, relationship, phone,
  /// phone_contact, message_phone1, message_phone1_contact, message_phone2,
  /// message_phone2_contact, link`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let link: String = row.get(10)?;
    Ok(Self {
      guardian_id: row.get(0)?,
      guardian:    GuardianInput {
        full_name:              row.get(1)?,
        cpf:                    row.get(2)?,
        relationship:           row.get(3)?,
        phone:                  row.get(4)?,
        phone_contact:          row.get(5)?,
        message_phone1:         row.get(6)?,
        message_phone1_contact: row.get(7)?,
        message_phone2:         row.get(8)?,
        message_phone2_contact: row.get(9)?,
        is_principal:           link == "principal",
      },
      link,
    })
  }

  pub fn into_linked(self) -> Result<LinkedGuardian> {
    Ok(LinkedGuardian {
      guardian_id: self.guardian_id,
      guardian:    self.guardian,
      link:        decode_link(&self.link)?,
    })
  }
}

pub struct RawEnrollment {
  pub enrollment_id: i64,
  pub course_id:     i64,
  pub course_name:   String,
  pub class_id:      i64,
  pub class_name:    String,
  pub status:        String,
  pub enrolled_at:   String,
}

impl RawEnrollment {
  pub fn into_record(self) -> Result<EnrollmentRecord> {
    Ok(EnrollmentRecord {
      enrollment_id: self.enrollment_id,
      course_id:     self.course_id,
      course_name:   self.course_name,
      class_id:      self.class_id,
      class_name:    self.class_name,
      status:        decode_status(&self.status)?,
      enrolled_at:   decode_dt(&self.enrolled_at)?,
    })
  }
}

/// Column list matching [`RawClass::from_row`].
pub const CLASS_COLUMNS: &str = "class_id, course_id, name, weekday, \
   start_time, end_time, term_start, term_end, seats, description";

pub struct RawClass {
  pub class_id:    i64,
  pub course_id:   i64,
  pub name:        String,
  pub weekday:     String,
  pub start_time:  String,
  pub end_time:    String,
  pub term_start:  Option<String>,
  pub term_end:    Option<String>,
  pub seats:       u32,
  pub description: Option<String>,
}

impl RawClass {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      class_id:    row.get(0)?,
      course_id:   row.get(1)?,
      name:        row.get(2)?,
      weekday:     row.get(3)?,
      start_time:  row.get(4)?,
      end_time:    row.get(5)?,
      term_start:  row.get(6)?,
      term_end:    row.get(7)?,
      seats:       row.get(8)?,
      description: row.get(9)?,
    })
  }

  pub fn into_class(self) -> Result<Class> {
    Ok(Class {
      class_id: self.class_id,
      details:  NewClass {
        course_id:   self.course_id,
        name:        self.name,
        weekday:     self.weekday,
        start_time:  decode_time(&self.start_time)?,
        end_time:    decode_time(&self.end_time)?,
        term_start:  decode_opt_date(self.term_start)?,
        term_end:    decode_opt_date(self.term_end)?,
        seats:       self.seats,
        description: self.description,
      },
    })
  }

  pub fn into_option(self) -> Result<ClassOption> {
    Ok(ClassOption {
      class_id:    self.class_id,
      name:        self.name,
      weekday:     self.weekday,
      start_time:  decode_time(&self.start_time)?,
      end_time:    decode_time(&self.end_time)?,
      seats:       self.seats,
      description: self.description,
    })
  }
}

/// Column list matching [`RawSession::from_row`].
pub const SESSION_COLUMNS: &str =
  "session_id, class_id, session_date, recorded_by, created_at";

pub struct RawSession {
  pub session_id:   i64,
  pub class_id:     i64,
  pub session_date: String,
  pub recorded_by:  i64,
  pub created_at:   String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:   row.get(0)?,
      class_id:     row.get(1)?,
      session_date: row.get(2)?,
      recorded_by:  row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_session(self) -> Result<ClassSession> {
    Ok(ClassSession {
      session_id:   self.session_id,
      class_id:     self.class_id,
      session_date: decode_date(&self.session_date)?,
      recorded_by:  self.recorded_by,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Expects `presence_id, session_id, student_id, mark, note`.
pub fn presence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PresenceRecord> {
  Ok(PresenceRecord {
    presence_id: row.get(0)?,
    session_id:  row.get(1)?,
    student_id:  row.get(2)?,
    mark:        row.get(3)?,
    note:        row.get(4)?,
  })
}

pub struct RawAttachment {
  pub attachment_id: i64,
  pub entity_type:   String,
  pub entity_id:     i64,
  pub kind:          String,
  pub file_name:     String,
  pub extension:     Option<String>,
  pub created_at:    String,
}

impl RawAttachment {
  /// Expects `attachment_id, entity_type, entity_id, kind, file_name,
  /// extension, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attachment_id: row.get(0)?,
      entity_type:   row.get(1)?,
      entity_id:     row.get(2)?,
      kind:          row.get(3)?,
      file_name:     row.get(4)?,
      extension:     row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_attachment(self) -> Result<Attachment> {
    Ok(Attachment {
      attachment_id: self.attachment_id,
      entity_type:   self.entity_type,
      entity_id:     self.entity_id,
      kind:          self.kind,
      file_name:     self.file_name,
      extension:     self.extension,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// One row of the student search join.
pub struct RawStudentRow {
  pub student_id:     i64,
  pub full_name:      String,
  pub cpf:            String,
  pub active:         bool,
  pub gender:         Option<String>,
  pub current_school: Option<String>,
  pub school_shift:   Option<String>,
  pub birth_date:     Option<String>,
  pub course_name:    Option<String>,
  pub class_name:     Option<String>,
  pub class_start:    Option<String>,
}

impl RawStudentRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:     row.get(0)?,
      full_name:      row.get(1)?,
      cpf:            row.get(2)?,
      active:         row.get(3)?,
      gender:         row.get(4)?,
      current_school: row.get(5)?,
      school_shift:   row.get(6)?,
      birth_date:     row.get(7)?,
      course_name:    row.get(8)?,
      class_name:     row.get(9)?,
      class_start:    row.get(10)?,
    })
  }

  pub fn into_row(self) -> Result<StudentRow> {
    Ok(StudentRow {
      student_id:     self.student_id,
      full_name:      self.full_name,
      cpf:            self.cpf,
      active:         self.active,
      gender:         self.gender,
      current_school: self.current_school,
      school_shift:   decode_school_shift(self.school_shift)?,
      birth_date:     decode_opt_date(self.birth_date)?,
      course_name:    self.course_name,
      class_name:     self.class_name,
      class_start:    self.class_start.as_deref().map(decode_time).transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_and_times_use_sortable_text() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(encode_date(d), "2025-03-07");
    assert_eq!(decode_date("2025-03-07").unwrap(), d);

    let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
    assert_eq!(encode_time(t), "09:05:00");
    assert_eq!(decode_time("09:05:00").unwrap(), t);
  }

  #[test]
  fn unknown_link_text_is_a_decode_error() {
    assert!(matches!(decode_link("tertiary"), Err(Error::Decode { .. })));
  }
}
