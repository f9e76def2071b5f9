//! Class sessions, presence records and the monthly attendance roll.
//!
//! The roll is a dense grid assembled from two sparse inputs: the sessions
//! that exist for a class in a month, and the presence records that were
//! actually written. [`AttendanceRoll::assemble`] does the merge; stores only
//! fetch the pieces.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::YearMonth;

/// Mark stored when a presence is submitted without one.
pub const DEFAULT_ABSENCE_MARK: &str = "F ";

// ─── Sessions ────────────────────────────────────────────────────────────────

/// One calendar occurrence of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
  pub session_id:   i64,
  pub class_id:     i64,
  pub session_date: NaiveDate,
  /// User the session is attributed to.
  pub recorded_by:  i64,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
  pub class_id:     i64,
  pub session_date: NaiveDate,
}

/// Partial update of a session. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionPatch {
  pub class_id:     Option<i64>,
  pub session_date: Option<NaiveDate>,
  pub recorded_by:  Option<i64>,
}

// ─── Presences ───────────────────────────────────────────────────────────────

/// One entry of a presence upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenceInput {
  pub student_id: i64,
  pub mark:       String,
  pub note:       Option<String>,
}

impl PresenceInput {
  /// The mark to store: [`DEFAULT_ABSENCE_MARK`] when blank.
  pub fn stored_mark(&self) -> &str {
    if self.mark.trim().is_empty() { DEFAULT_ABSENCE_MARK } else { &self.mark }
  }

  /// The note to store: `None` when blank.
  pub fn stored_note(&self) -> Option<&str> {
    self.note.as_deref().filter(|n| !n.trim().is_empty())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
  pub presence_id: i64,
  pub session_id:  i64,
  pub student_id:  i64,
  pub mark:        String,
  pub note:        Option<String>,
}

/// How an upsert resolved, per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
  pub inserted: usize,
  pub updated:  usize,
}

// ─── Roll ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlot {
  pub session_id: i64,
  pub date:       NaiveDate,
}

/// A student actively enrolled in the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
  pub student_id: i64,
  pub full_name:  String,
}

/// One cell of the grid. A cell with no `presence_id` was never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceCell {
  pub presence_id: Option<i64>,
  pub mark:        String,
  pub note:        String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendance {
  pub student_id: i64,
  pub full_name:  String,
  pub presences:  BTreeMap<NaiveDate, PresenceCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRoll {
  pub class_id: i64,
  pub month:    YearMonth,
  pub sessions: Vec<SessionSlot>,
  pub students: Vec<StudentAttendance>,
  /// Sessions materialised by the call that produced this roll.
  pub created:  usize,
}

impl AttendanceRoll {
  /// Merge sessions, roster and presence records into a dense grid.
  ///
  /// Sessions come out ascending by date and students by name. Every student
  /// gets a cell for every session; records for students outside the roster
  /// or sessions outside the set are dropped.
  pub fn assemble(
    class_id: i64,
    month: YearMonth,
    mut sessions: Vec<SessionSlot>,
    mut roster: Vec<RosterEntry>,
    records: Vec<PresenceRecord>,
    created: usize,
  ) -> Self {
    sessions.sort_by_key(|s| (s.date, s.session_id));
    roster.sort_by(|a, b| {
      a.full_name.cmp(&b.full_name).then(a.student_id.cmp(&b.student_id))
    });

    let date_of: HashMap<i64, NaiveDate> =
      sessions.iter().map(|s| (s.session_id, s.date)).collect();

    let mut students: Vec<StudentAttendance> = roster
      .into_iter()
      .map(|r| StudentAttendance {
        student_id: r.student_id,
        full_name:  r.full_name,
        presences:  sessions
          .iter()
          .map(|s| (s.date, PresenceCell::default()))
          .collect(),
      })
      .collect();
    let index: HashMap<i64, usize> = students
      .iter()
      .enumerate()
      .map(|(i, s)| (s.student_id, i))
      .collect();

    for rec in records {
      let (Some(&date), Some(&i)) =
        (date_of.get(&rec.session_id), index.get(&rec.student_id))
      else {
        continue;
      };
      students[i].presences.insert(date, PresenceCell {
        presence_id: Some(rec.presence_id),
        mark:        rec.mark,
        note:        rec.note.unwrap_or_default(),
      });
    }

    Self { class_id, month, sessions, students, created }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 11, day).unwrap() }

  fn entry(id: i64, name: &str) -> RosterEntry {
    RosterEntry { student_id: id, full_name: name.into() }
  }

  #[test]
  fn missing_cells_are_empty_and_written_cells_carry_ids() {
    let sessions = vec![
      SessionSlot { session_id: 11, date: d(10) },
      SessionSlot { session_id: 10, date: d(3) },
    ];
    let roster = vec![entry(2, "Bruno"), entry(1, "Ana")];
    let records = vec![PresenceRecord {
      presence_id: 99,
      session_id:  10,
      student_id:  2,
      mark:        "P".into(),
      note:        None,
    }];
    let roll = AttendanceRoll::assemble(
      7,
      YearMonth::new(2025, 11).unwrap(),
      sessions,
      roster,
      records,
      2,
    );

    let dates: Vec<_> = roll.sessions.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![d(3), d(10)]);
    let names: Vec<_> =
      roll.students.iter().map(|s| s.full_name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Bruno"]);

    let ana = &roll.students[0];
    assert_eq!(ana.presences.len(), 2);
    assert!(ana.presences.values().all(|c| *c == PresenceCell::default()));

    let bruno = &roll.students[1];
    assert_eq!(bruno.presences[&d(3)].presence_id, Some(99));
    assert_eq!(bruno.presences[&d(3)].mark, "P");
    assert_eq!(bruno.presences[&d(10)].presence_id, None);
  }

  #[test]
  fn records_outside_roster_or_sessions_are_dropped() {
    let records = vec![
      PresenceRecord {
        presence_id: 1,
        session_id:  10,
        student_id:  42,
        mark:        "P".into(),
        note:        None,
      },
      PresenceRecord {
        presence_id: 2,
        session_id:  77,
        student_id:  1,
        mark:        "P".into(),
        note:        None,
      },
    ];
    let roll = AttendanceRoll::assemble(
      7,
      YearMonth::new(2025, 11).unwrap(),
      vec![SessionSlot { session_id: 10, date: d(3) }],
      vec![entry(1, "Ana")],
      records,
      0,
    );
    assert_eq!(roll.students.len(), 1);
    assert_eq!(roll.students[0].presences[&d(3)].presence_id, None);
  }

  #[test]
  fn blank_mark_and_note_are_normalised() {
    let p = PresenceInput { student_id: 1, mark: " ".into(), note: Some("".into()) };
    assert_eq!(p.stored_mark(), DEFAULT_ABSENCE_MARK);
    assert_eq!(p.stored_note(), None);

    let p = PresenceInput { student_id: 1, mark: "P".into(), note: Some("late".into()) };
    assert_eq!(p.stored_mark(), "P");
    assert_eq!(p.stored_note(), Some("late"));
  }
}
