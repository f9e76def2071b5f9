//! Student search: filter predicates and result grouping.
//!
//! A [`StudentFilter`] is lowered to a list of typed [`Clause`]s which a
//! backend renders into its own query language with bound parameters. The
//! backend returns one [`StudentRow`] per (student, active class) pair and
//! [`group_rows`] folds them into per-student summaries.

use chrono::{Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
  catalog::ClassShift,
  student::{SchoolShift, StudentStatus, age_on},
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Optional search criteria, combined with AND. Blank strings are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentFilter {
  pub name:         Option<String>,
  pub cpf:          Option<String>,
  pub status:       Option<StudentStatus>,
  pub gender:       Option<String>,
  pub school:       Option<String>,
  pub school_shift: Option<SchoolShift>,
  pub age:          Option<u32>,
  pub course:       Option<String>,
  pub class:        Option<String>,
}

/// Columns a clause may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  FullName,
  Cpf,
  Gender,
  CurrentSchool,
  SchoolShift,
  CourseName,
  ClassName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
  /// Case-insensitive substring match.
  Contains(Column, String),
  /// Exact match.
  Equals(Column, String),
  Active(bool),
  /// `after < birth_date <= until`.
  BornBetween { after: NaiveDate, until: NaiveDate },
}

impl StudentFilter {
  /// Lower the filter to clauses. `today` anchors the age computation.
  pub fn clauses(&self, today: NaiveDate) -> Vec<Clause> {
    let mut out = Vec::new();
    let mut contains = |col, v: &Option<String>| {
      if let Some(v) = non_blank(v) {
        out.push(Clause::Contains(col, v.to_owned()));
      }
    };
    contains(Column::FullName, &self.name);
    contains(Column::Cpf, &self.cpf);
    contains(Column::CurrentSchool, &self.school);
    contains(Column::CourseName, &self.course);
    contains(Column::ClassName, &self.class);

    if let Some(g) = non_blank(&self.gender) {
      out.push(Clause::Equals(Column::Gender, g.to_owned()));
    }
    if let Some(shift) = self.school_shift {
      out.push(Clause::Equals(Column::SchoolShift, shift.as_str().to_owned()));
    }
    if let Some(status) = self.status {
      out.push(Clause::Active(status.is_active()));
    }
    if let Some(age) = self.age {
      out.push(born_between_for_age(age, today));
    }
    out
  }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
  v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Students aged exactly `age` on `today` were born in
/// `(today - (age + 1) years, today - age years]`.
fn born_between_for_age(age: u32, today: NaiveDate) -> Clause {
  let years_ago = |n: u32| {
    n.checked_mul(12)
      .and_then(|m| today.checked_sub_months(Months::new(m)))
      .unwrap_or(NaiveDate::MIN)
  };
  Clause::BornBetween {
    after: years_ago(age.saturating_add(1)),
    until: years_ago(age),
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One row of the joined search query. Enrollment columns are `None` for a
/// student without active enrollments.
#[derive(Debug, Clone)]
pub struct StudentRow {
  pub student_id:     i64,
  pub full_name:      String,
  pub cpf:            String,
  pub active:         bool,
  pub gender:         Option<String>,
  pub current_school: Option<String>,
  pub school_shift:   Option<SchoolShift>,
  pub birth_date:     Option<NaiveDate>,
  pub course_name:    Option<String>,
  pub class_name:     Option<String>,
  pub class_start:    Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
  pub student_id:     i64,
  pub full_name:      String,
  pub cpf:            String,
  pub status:         StudentStatus,
  pub gender:         Option<String>,
  pub current_school: Option<String>,
  pub school_shift:   Option<SchoolShift>,
  pub age:            Option<u32>,
  pub courses:        Vec<String>,
  pub classes:        Vec<String>,
  pub shifts:         Vec<ClassShift>,
}

/// Fold rows into one summary per student, keeping first-seen order for both
/// students and their aggregated lists. Lists hold no duplicates.
pub fn group_rows(rows: Vec<StudentRow>, today: NaiveDate) -> Vec<StudentSummary> {
  let mut out: Vec<StudentSummary> = Vec::new();
  for row in rows {
    let i = match out.iter().rposition(|s| s.student_id == row.student_id) {
      Some(i) => i,
      None => {
        out.push(StudentSummary {
          student_id:     row.student_id,
          full_name:      row.full_name.clone(),
          cpf:            row.cpf.clone(),
          status:         StudentStatus::from_active(row.active),
          gender:         row.gender.clone(),
          current_school: row.current_school.clone(),
          school_shift:   row.school_shift,
          age:            row.birth_date.and_then(|b| age_on(b, today)),
          courses:        Vec::new(),
          classes:        Vec::new(),
          shifts:         Vec::new(),
        });
        out.len() - 1
      }
    };
    let summary = &mut out[i];
    push_unique(&mut summary.courses, row.course_name);
    push_unique(&mut summary.classes, row.class_name);
    push_unique(&mut summary.shifts, row.class_start.map(ClassShift::from_start));
  }
  out
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: Option<T>) {
  if let Some(item) = item
    && !list.contains(&item)
  {
    list.push(item);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 11, 10).unwrap() }

  fn row(id: i64, name: &str, course: Option<&str>, class: Option<(&str, u32)>) -> StudentRow {
    StudentRow {
      student_id:     id,
      full_name:      name.into(),
      cpf:            format!("{id:011}"),
      active:         true,
      gender:         None,
      current_school: None,
      school_shift:   None,
      birth_date:     NaiveDate::from_ymd_opt(2012, 11, 10),
      course_name:    course.map(Into::into),
      class_name:     class.map(|(c, _)| c.into()),
      class_start:    class.and_then(|(_, h)| NaiveTime::from_hms_opt(h, 0, 0)),
    }
  }

  #[test]
  fn blank_filters_produce_no_clauses() {
    let f = StudentFilter {
      name: Some("  ".into()),
      gender: Some(String::new()),
      ..Default::default()
    };
    assert!(f.clauses(today()).is_empty());
  }

  #[test]
  fn every_criterion_becomes_one_clause() {
    let f = StudentFilter {
      name: Some("ana".into()),
      cpf: Some("111".into()),
      status: Some(StudentStatus::Active),
      gender: Some("F".into()),
      school: Some("Estadual".into()),
      school_shift: Some(SchoolShift::Morning),
      age: Some(13),
      course: Some("Inform".into()),
      class: Some("Turma".into()),
    };
    let clauses = f.clauses(today());
    assert_eq!(clauses.len(), 9);
    assert!(clauses.contains(&Clause::Active(true)));
    assert!(clauses.contains(&Clause::Equals(Column::SchoolShift, "morning".into())));
  }

  #[test]
  fn age_clause_brackets_birthdays() {
    let f = StudentFilter { age: Some(13), ..Default::default() };
    let clauses = f.clauses(today());
    let [Clause::BornBetween { after, until }] = clauses.as_slice() else {
      panic!("expected a single age clause");
    };
    let (after, until) = (*after, *until);
    assert_eq!(until, NaiveDate::from_ymd_opt(2012, 11, 10).unwrap());
    assert_eq!(after, NaiveDate::from_ymd_opt(2011, 11, 10).unwrap());
    assert_eq!(age_on(until, today()), Some(13));
    assert_eq!(age_on(after.succ_opt().unwrap(), today()), Some(13));
    assert_eq!(age_on(after, today()), Some(14));
  }

  #[test]
  fn rows_group_per_student_with_deduplicated_lists() {
    let rows = vec![
      row(1, "Ana", Some("Informática"), Some(("Turma 7", 14))),
      row(1, "Ana", Some("Informática"), Some(("Turma 8", 9))),
      row(1, "Ana", Some("Música"), Some(("Coral", 15))),
      row(2, "Bruno", None, None),
    ];
    let out = group_rows(rows, today());
    assert_eq!(out.len(), 2);

    let ana = &out[0];
    assert_eq!(ana.courses, vec!["Informática", "Música"]);
    assert_eq!(ana.classes, vec!["Turma 7", "Turma 8", "Coral"]);
    assert_eq!(ana.shifts, vec![ClassShift::Afternoon, ClassShift::Morning]);
    assert_eq!(ana.age, Some(13));

    let bruno = &out[1];
    assert!(bruno.courses.is_empty());
    assert!(bruno.shifts.is_empty());
  }
}
