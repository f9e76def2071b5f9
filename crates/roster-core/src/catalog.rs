//! Courses and classes as seen by the enrollment engine.
//!
//! Catalog maintenance is handled elsewhere; this module only carries what
//! enrollment and attendance need to read: seat counters, the weekly slot of a
//! class, and its term window.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::student::SchoolShift;

// ─── Class shift ─────────────────────────────────────────────────────────────

/// Period of the day a class runs in, derived from its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassShift {
  Morning,
  Afternoon,
  Evening,
}

impl ClassShift {
  /// Before 12:00 is morning, 12:00 up to (not including) 18:00 is afternoon,
  /// anything later is evening.
  pub fn from_start(start: NaiveTime) -> Self {
    match start.hour() {
      0..12 => Self::Morning,
      12..18 => Self::Afternoon,
      _ => Self::Evening,
    }
  }
}

/// Which class start times suit a student attending school in `shift`.
///
/// Students are offered the opposite half of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartWindow {
  /// No restriction.
  Any,
  /// Classes starting at or after noon.
  FromNoon,
  /// Classes starting before noon.
  BeforeNoon,
  /// No class fits. Full-day students have no free half of the day, and the
  /// catalog has no weekend or evening-only offer to match them against yet.
  Nothing,
}

impl StartWindow {
  pub fn for_shift(shift: Option<SchoolShift>) -> Self {
    match shift {
      None => Self::Any,
      Some(SchoolShift::Morning) => Self::FromNoon,
      Some(SchoolShift::Afternoon) => Self::BeforeNoon,
      Some(SchoolShift::FullDay) => Self::Nothing,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Input to `SqliteStore::add_course`. Available seats start equal to
/// `total_seats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
  pub name:        String,
  pub total_seats: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub course_id:       i64,
  pub name:            String,
  pub total_seats:     u32,
  pub available_seats: u32,
  pub active:          bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
  pub course_id:   i64,
  pub name:        String,
  /// Recurrence day as entered in the catalog, e.g. `"Segunda-feira"`.
  pub weekday:     String,
  pub start_time:  NaiveTime,
  pub end_time:    NaiveTime,
  pub term_start:  Option<NaiveDate>,
  pub term_end:    Option<NaiveDate>,
  pub seats:       u32,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
  pub class_id:    i64,
  #[serde(flatten)]
  pub details:     NewClass,
}

impl Class {
  /// `true` if `date` falls inside the term. Missing bounds are open.
  pub fn term_contains(&self, date: NaiveDate) -> bool {
    self.details.term_start.is_none_or(|s| date >= s)
      && self.details.term_end.is_none_or(|e| date <= e)
  }
}

// ─── Available courses ───────────────────────────────────────────────────────

/// A course still open for enrollment, with the classes on offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOption {
  pub course_id:       i64,
  pub name:            String,
  pub total_seats:     u32,
  pub available_seats: u32,
  pub classes:         Vec<ClassOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOption {
  pub class_id:    i64,
  pub name:        String,
  pub weekday:     String,
  pub start_time:  NaiveTime,
  pub end_time:    NaiveTime,
  pub seats:       u32,
  pub description: Option<String>,
}
