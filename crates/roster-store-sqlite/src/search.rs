//! Rendering of search clauses into SQL with bound parameters.

use chrono::NaiveDate;
use rusqlite::{Connection, types::Value};

use roster_core::{
  enrollment::EnrollmentStatus,
  search::{Clause, Column, StudentRow},
};

use crate::{
  Result,
  encode::{RawStudentRow, encode_date},
};

fn column_sql(c: Column) -> &'static str {
  match c {
    Column::FullName => "s.full_name",
    Column::Cpf => "s.cpf",
    Column::Gender => "s.gender",
    Column::CurrentSchool => "s.current_school",
    Column::SchoolShift => "s.school_shift",
    Column::CourseName => "mo.name",
    Column::ClassName => "mc.name",
  }
}

/// Course and class predicates select students through a single active
/// enrollment; they never narrow the joined rows.
fn targets_enrollment(clause: &Clause) -> bool {
  matches!(
    clause,
    Clause::Contains(Column::CourseName | Column::ClassName, _)
      | Clause::Equals(Column::CourseName | Column::ClassName, _)
  )
}

/// Escape `LIKE` wildcards so user text only ever matches literally.
fn like_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    if matches!(ch, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}

fn push_clause(clause: &Clause, conds: &mut Vec<String>, params: &mut Vec<Value>) {
  match clause {
    Clause::Contains(col, text) => {
      conds.push(format!(
        "{} LIKE '%' || ? || '%' ESCAPE '\\'",
        column_sql(*col)
      ));
      params.push(Value::Text(like_escape(text)));
    }
    Clause::Equals(col, text) => {
      conds.push(format!("{} = ?", column_sql(*col)));
      params.push(Value::Text(text.clone()));
    }
    Clause::Active(active) => {
      conds.push("s.active = ?".to_owned());
      params.push(Value::Integer(i64::from(*active)));
    }
    Clause::BornBetween { after, until } => {
      conds.push("s.birth_date > ? AND s.birth_date <= ?".to_owned());
      params.push(Value::Text(encode_date(*after)));
      params.push(Value::Text(encode_date(*until)));
    }
  }
}

/// Render clauses as an AND-joined `WHERE` body plus its parameters, in
/// placeholder order.
pub(crate) fn render(clauses: &[Clause]) -> (String, Vec<Value>) {
  let mut conds = Vec::with_capacity(clauses.len());
  let mut params = Vec::with_capacity(clauses.len());
  let mut enrolled = Vec::new();
  let mut enrolled_params = Vec::new();
  for clause in clauses {
    if targets_enrollment(clause) {
      push_clause(clause, &mut enrolled, &mut enrolled_params);
    } else {
      push_clause(clause, &mut conds, &mut params);
    }
  }
  if !enrolled.is_empty() {
    conds.push(format!(
      "s.student_id IN (
         SELECT m.student_id
           FROM enrollments m
           JOIN classes mc ON mc.class_id  = m.class_id
           JOIN courses mo ON mo.course_id = m.course_id
          WHERE m.status = ? AND {})",
      enrolled.join(" AND ")
    ));
    params.push(Value::Text(EnrollmentStatus::Active.as_str().to_owned()));
    params.extend(enrolled_params);
  }
  (conds.join(" AND "), params)
}

/// One row per (student, active enrollment); students without one appear once
/// with NULL enrollment columns.
pub(crate) fn query(conn: &Connection, clauses: &[Clause]) -> Result<Vec<StudentRow>> {
  let (conds, mut params) = render(clauses);
  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {conds}")
  };
  params.insert(0, Value::Text(EnrollmentStatus::Active.as_str().to_owned()));

  let sql = format!(
    "SELECT s.student_id, s.full_name, s.cpf, s.active, s.gender,
            s.current_school, s.school_shift, s.birth_date,
            co.name, cl.name, cl.start_time
       FROM students s
       LEFT JOIN enrollments e ON e.student_id = s.student_id AND e.status = ?
       LEFT JOIN classes cl    ON cl.class_id  = e.class_id
       LEFT JOIN courses co    ON co.course_id = e.course_id
       {where_clause}
      ORDER BY s.full_name, s.student_id, e.enrollment_id"
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params_from_iter(params), RawStudentRow::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawStudentRow::into_row).collect()
}

/// Today's date in local time; anchors age filters.
pub(crate) fn today() -> NaiveDate { chrono::Local::now().date_naive() }
