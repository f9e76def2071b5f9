//! Catalog seed files.
//!
//! A seed file is JSON listing courses and their classes:
//!
//! ```json
//! { "courses": [
//!   { "name": "Robótica", "totalSeats": 20, "classes": [
//!     { "name": "Robótica A", "weekday": "Segunda-feira",
//!       "startTime": "14:00:00", "endTime": "16:00:00",
//!       "termStart": "2025-02-01", "termEnd": "2025-12-15" } ] } ] }
//! ```
//!
//! Class seats default to the course's total.

use chrono::{NaiveDate, NaiveTime};
use roster_core::catalog::{NewClass, NewCourse};
use roster_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Catalog {
  pub courses: Vec<SeedCourse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCourse {
  pub name:        String,
  pub total_seats: u32,
  #[serde(default)]
  pub classes:     Vec<SeedClass>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedClass {
  pub name:        String,
  pub weekday:     String,
  pub start_time:  NaiveTime,
  pub end_time:    NaiveTime,
  #[serde(default)]
  pub term_start:  Option<NaiveDate>,
  #[serde(default)]
  pub term_end:    Option<NaiveDate>,
  #[serde(default)]
  pub seats:       Option<u32>,
  #[serde(default)]
  pub description: Option<String>,
}

/// What a seed run inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Seeded {
  pub courses: usize,
  pub classes: usize,
}

/// Insert every course of `catalog`, then its classes.
///
/// Not idempotent: running the same file twice creates duplicate courses.
pub async fn load(store: &SqliteStore, catalog: Catalog) -> roster_store_sqlite::Result<Seeded> {
  let mut seeded = Seeded::default();
  for course in catalog.courses {
    let created = store
      .add_course(NewCourse { name: course.name, total_seats: course.total_seats })
      .await?;
    seeded.courses += 1;
    for class in course.classes {
      store
        .add_class(NewClass {
          course_id:   created.course_id,
          name:        class.name,
          weekday:     class.weekday,
          start_time:  class.start_time,
          end_time:    class.end_time,
          term_start:  class.term_start,
          term_end:    class.term_end,
          seats:       class.seats.unwrap_or(created.total_seats),
          description: class.description,
        })
        .await?;
      seeded.classes += 1;
    }
  }
  info!(courses = seeded.courses, classes = seeded.classes, "catalog seeded");
  Ok(seeded)
}

#[cfg(test)]
mod tests {
  use roster_core::store::SchoolStore;

  use super::*;

  const CATALOG: &str = r#"{
    "courses": [
      { "name": "Robótica", "totalSeats": 20, "classes": [
        { "name": "Robótica A", "weekday": "Segunda-feira",
          "startTime": "14:00:00", "endTime": "16:00:00",
          "termStart": "2025-02-01", "termEnd": "2025-12-15" },
        { "name": "Robótica B", "weekday": "Quarta", "seats": 10,
          "startTime": "08:00:00", "endTime": "10:00:00" }
      ] },
      { "name": "Xadrez", "totalSeats": 8 }
    ]
  }"#;

  #[tokio::test]
  async fn loads_courses_and_classes() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let catalog: Catalog = serde_json::from_str(CATALOG).unwrap();
    let seeded = load(&store, catalog).await.unwrap();
    assert_eq!(seeded, Seeded { courses: 2, classes: 2 });

    let offered = store.available_courses(None).await.unwrap();
    assert_eq!(offered.len(), 1);
    assert_eq!(offered[0].name, "Robótica");
    assert_eq!(offered[0].available_seats, 20);
    assert_eq!(offered[0].classes.len(), 2);
  }
}
