//! Enrollment commands and results.
//!
//! A [`NewEnrollment`] is the whole enrollment form: the student, their
//! guardians, the classes requested and any documents. The same payload drives
//! both creation and update. [`NewEnrollment::validated`] is the only gate
//! before a store touches the database.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  attachment::{Attachment, DocumentInput},
  student::{GuardianInput, LinkedGuardian, Student, StudentProfile, normalize_cpf},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentStatus {
  Active,
  Cancelled,
}

impl EnrollmentStatus {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Active => "ACTIVE",
      Self::Cancelled => "CANCELLED",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "ACTIVE" => Some(Self::Active),
      "CANCELLED" => Some(Self::Cancelled),
      _ => None,
    }
  }
}

// ─── Command ─────────────────────────────────────────────────────────────────

/// One requested seat: a class together with the course it is expected to
/// belong to. The course is the one whose counter is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassChoice {
  pub course_id: i64,
  pub class_id:  i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEnrollment {
  pub student:   StudentProfile,
  pub guardians: Vec<GuardianInput>,
  pub classes:   Vec<ClassChoice>,
  pub documents: Vec<DocumentInput>,
}

impl NewEnrollment {
  /// Check the form and normalise every CPF in it.
  ///
  /// Requires a student name and CPF, and at least one guardian flagged
  /// principal. Each guardian needs a name and a valid CPF of their own, and
  /// no CPF may be listed twice.
  pub fn validated(mut self) -> Result<Self> {
    self.student.full_name = self.student.full_name.trim().to_owned();
    if self.student.full_name.is_empty() {
      return Err(Error::Validation("student full name is required".into()));
    }
    if self.student.cpf.trim().is_empty() {
      return Err(Error::Validation("student CPF is required".into()));
    }
    self.student.cpf = normalize_cpf(&self.student.cpf)?;

    if !self.guardians.iter().any(|g| g.is_principal) {
      return Err(Error::Validation(
        "at least one principal guardian is required".into(),
      ));
    }
    let mut seen = HashSet::with_capacity(self.guardians.len());
    for g in &mut self.guardians {
      g.full_name = g.full_name.trim().to_owned();
      if g.full_name.is_empty() {
        return Err(Error::Validation("guardian full name is required".into()));
      }
      g.cpf = normalize_cpf(&g.cpf)?;
      if !seen.insert(g.cpf.clone()) {
        return Err(Error::Validation(format!(
          "guardian CPF {} is listed more than once",
          g.cpf
        )));
      }
    }
    Ok(self)
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// What a successful create or update committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentReceipt {
  pub student_id:     i64,
  pub enrollment_ids: Vec<i64>,
}

/// What a cancellation released. `released_classes` holds one entry per
/// enrollment that left ACTIVE, so it is empty when cancelling twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
  pub student_id:       i64,
  pub released_classes: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
  pub enrollment_id: i64,
  pub course_id:     i64,
  pub course_name:   String,
  pub class_id:      i64,
  pub class_name:    String,
  pub status:        EnrollmentStatus,
  pub enrolled_at:   DateTime<Utc>,
}

/// Everything known about one student's enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetail {
  pub student:     Student,
  pub guardians:   Vec<LinkedGuardian>,
  pub enrollments: Vec<EnrollmentRecord>,
  pub documents:   Vec<Attachment>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form() -> NewEnrollment {
    NewEnrollment {
      student: StudentProfile {
        full_name: " Ana Silva ".into(),
        cpf: "111.222.333-44".into(),
        ..Default::default()
      },
      guardians: vec![GuardianInput {
        full_name: "Maria Silva".into(),
        cpf: "555.666.777-88".into(),
        is_principal: true,
        ..Default::default()
      }],
      classes: vec![ClassChoice { course_id: 1, class_id: 7 }],
      documents: vec![],
    }
  }

  #[test]
  fn validation_normalises_cpfs_and_names() {
    let f = form().validated().unwrap();
    assert_eq!(f.student.full_name, "Ana Silva");
    assert_eq!(f.student.cpf, "11122233344");
    assert_eq!(f.guardians[0].cpf, "55566677788");
  }

  #[test]
  fn missing_principal_guardian_is_rejected() {
    let mut f = form();
    f.guardians[0].is_principal = false;
    assert!(matches!(f.validated(), Err(Error::Validation(_))));
  }

  #[test]
  fn repeated_guardian_cpf_is_rejected() {
    let mut f = form();
    let mut again = f.guardians[0].clone();
    again.cpf = "55566677788".into();
    again.is_principal = false;
    f.guardians.push(again);
    assert!(matches!(f.validated(), Err(Error::Validation(_))));
  }

  #[test]
  fn missing_name_or_cpf_is_rejected() {
    let mut f = form();
    f.student.full_name = "   ".into();
    assert!(matches!(f.validated(), Err(Error::Validation(_))));

    let mut f = form();
    f.student.cpf.clear();
    assert!(matches!(f.validated(), Err(Error::Validation(_))));
  }

  #[test]
  fn status_round_trips_through_its_column_text() {
    for s in [EnrollmentStatus::Active, EnrollmentStatus::Cancelled] {
      assert_eq!(EnrollmentStatus::parse(s.as_str()), Some(s));
    }
  }
}
