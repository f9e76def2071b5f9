//! Students and their guardians.
//!
//! A student is keyed by CPF and is never deleted; cancelling an enrollment
//! deactivates the student instead. Guardians are shared between students
//! with the same guardian CPF and are linked through a typed pivot.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── CPF ─────────────────────────────────────────────────────────────────────

/// Number of digits in a normalised CPF.
pub const CPF_DIGITS: usize = 11;

/// Strip the usual `000.000.000-00` punctuation and require exactly eleven
/// digits.
pub fn normalize_cpf(raw: &str) -> Result<String> {
  let digits: String = raw
    .chars()
    .filter(|c| !matches!(c, '.' | '-' | ' '))
    .collect();
  if digits.len() != CPF_DIGITS || !digits.chars().all(|c| c.is_ascii_digit())
  {
    return Err(Error::Validation(format!(
      "CPF must have {CPF_DIGITS} digits, got {raw:?}"
    )));
  }
  Ok(digits)
}

// ─── Shifts ──────────────────────────────────────────────────────────────────

/// The period of the day a student attends regular school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchoolShift {
  Morning,
  Afternoon,
  FullDay,
}

impl SchoolShift {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Morning => "morning",
      Self::Afternoon => "afternoon",
      Self::FullDay => "full-day",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "morning" => Some(Self::Morning),
      "afternoon" => Some(Self::Afternoon),
      "full-day" => Some(Self::FullDay),
      _ => None,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Whether the student currently holds an enrollment with the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
  #[serde(rename = "ATIVO", alias = "active")]
  Active,
  #[serde(rename = "INATIVO", alias = "inactive")]
  Inactive,
}

impl StudentStatus {
  pub fn from_active(active: bool) -> Self {
    if active { Self::Active } else { Self::Inactive }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Student fields as submitted by the enrollment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentProfile {
  pub full_name:      String,
  pub cpf:            String,
  pub birth_date:     Option<NaiveDate>,
  pub gender:         Option<String>,
  pub phone:          Option<String>,
  pub zip_code:       Option<String>,
  pub street:         Option<String>,
  pub house_number:   Option<String>,
  pub neighborhood:   Option<String>,
  pub current_school: Option<String>,
  pub grade:          Option<String>,
  pub school_shift:   Option<SchoolShift>,
  pub notes:          Option<String>,
}

/// One guardian entry in an enrollment payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardianInput {
  pub full_name:              String,
  pub cpf:                    String,
  /// Free-text relationship to the student, e.g. "mãe", "avô".
  pub relationship:           Option<String>,
  pub phone:                  Option<String>,
  pub phone_contact:          Option<String>,
  pub message_phone1:         Option<String>,
  pub message_phone1_contact: Option<String>,
  pub message_phone2:         Option<String>,
  pub message_phone2_contact: Option<String>,
  pub is_principal:           bool,
}

/// The role a guardian plays for one particular student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardianLinkKind {
  Principal,
  Secondary,
}

impl GuardianLinkKind {
  pub fn for_input(g: &GuardianInput) -> Self {
    if g.is_principal { Self::Principal } else { Self::Secondary }
  }
}

// ─── Stored ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub student_id:  i64,
  #[serde(flatten)]
  pub profile:     StudentProfile,
  pub enrolled_at: DateTime<Utc>,
  pub status:      StudentStatus,
}

impl Student {
  /// Age in whole years on `today`, if the birth date is known.
  pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
    self.profile.birth_date.and_then(|b| age_on(b, today))
  }
}

/// A guardian as linked to a specific student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedGuardian {
  pub guardian_id: i64,
  #[serde(flatten)]
  pub guardian:    GuardianInput,
  pub link:        GuardianLinkKind,
}

/// Whole years between `birth` and `today`; `None` if `birth` is in the
/// future.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
  let mut years = today.year() - birth.year();
  if (today.month(), today.day()) < (birth.month(), birth.day()) {
    years -= 1;
  }
  u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cpf_punctuation_is_stripped() {
    assert_eq!(normalize_cpf("111.222.333-44").unwrap(), "11122233344");
    assert_eq!(normalize_cpf("11122233344").unwrap(), "11122233344");
  }

  #[test]
  fn cpf_with_wrong_length_or_letters_is_rejected() {
    assert!(normalize_cpf("1112223334").is_err());
    assert!(normalize_cpf("1112223334a").is_err());
    assert!(normalize_cpf("").is_err());
  }

  #[test]
  fn age_counts_completed_years() {
    let birth = NaiveDate::from_ymd_opt(2010, 6, 15).unwrap();
    let before = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
    let on = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    assert_eq!(age_on(birth, before), Some(14));
    assert_eq!(age_on(birth, on), Some(15));
    assert_eq!(age_on(on, birth), None);
  }

  #[test]
  fn status_accepts_both_spellings() {
    let s: StudentStatus = serde_json::from_str("\"ATIVO\"").unwrap();
    assert_eq!(s, StudentStatus::Active);
    let s: StudentStatus = serde_json::from_str("\"inactive\"").unwrap();
    assert_eq!(s, StudentStatus::Inactive);
  }
}
