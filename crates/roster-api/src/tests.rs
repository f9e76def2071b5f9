//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use chrono::{NaiveDate, NaiveTime};
use roster_core::catalog::{Class, NewClass, NewCourse};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  api_router,
  caller::{USER_ID_HEADER, USERNAME_HEADER},
};

struct Harness {
  store: Arc<SqliteStore>,
  class: Class,
}

async fn harness(seats: u32) -> Harness {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let course = store
    .add_course(NewCourse { name: "Robótica".into(), total_seats: seats })
    .await
    .unwrap();
  let class = store
    .add_class(NewClass {
      course_id:   course.course_id,
      name:        "Robótica A".into(),
      weekday:     "Segunda-feira".into(),
      start_time:  NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
      end_time:    NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
      term_start:  NaiveDate::from_ymd_opt(2025, 2, 1),
      term_end:    NaiveDate::from_ymd_opt(2025, 12, 15),
      seats,
      description: None,
    })
    .await
    .unwrap();
  Harness { store: Arc::new(store), class }
}

impl Harness {
  async fn send(
    &self,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder
        .header(USER_ID_HEADER, user)
        .header(USERNAME_HEADER, "secretaria");
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(self.store.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  fn enrollment(&self, name: &str, cpf: &str) -> Value {
    json!({
      "student": {
        "fullName": name,
        "cpf": cpf,
        "birthDate": "2012-05-20",
        "schoolShift": "morning"
      },
      "guardians": [
        { "fullName": "Maria Silva", "cpf": "98765432100", "isPrincipal": true }
      ],
      "classes": [
        { "courseId": self.class.details.course_id, "classId": self.class.class_id }
      ],
      "documents": [
        { "kind": "birth certificate", "fileName": "certidao.PDF" }
      ]
    })
  }
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ── Enrollments ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_enrollment_returns_201_with_receipt_and_documents() {
  let h = harness(5).await;
  let resp = h
    .send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "123.456.789-01")))
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = json_body(resp).await;
  assert!(body["data"]["studentId"].as_i64().is_some());
  assert_eq!(body["data"]["enrollmentIds"].as_array().unwrap().len(), 1);
  assert_eq!(body["data"]["documents"][0]["extension"], "pdf");

  let course = h.store.course(h.class.details.course_id).await.unwrap();
  assert_eq!(course.available_seats, 4);
}

#[tokio::test]
async fn duplicate_cpf_is_409() {
  let h = harness(5).await;
  let first = h
    .send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
    .await;
  assert_eq!(first.status(), StatusCode::CREATED);

  let second = h
    .send("POST", "/enrollments", None, Some(h.enrollment("Ana Souza", "123.456.789-01")))
    .await;
  assert_eq!(second.status(), StatusCode::CONFLICT);
  let body = json_body(second).await;
  assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn missing_principal_guardian_is_400() {
  let h = harness(5).await;
  let mut input = h.enrollment("Ana Silva", "12345678901");
  input["guardians"][0]["isPrincipal"] = json!(false);
  let resp = h.send("POST", "/enrollments", None, Some(input)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["error"], "validation failed");
}

#[tokio::test]
async fn malformed_json_is_400() {
  let h = harness(5).await;
  let req = Request::builder()
    .method("POST")
    .uri("/enrollments")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{\"student\":"))
    .unwrap();
  let resp = api_router(h.store.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_course_is_422() {
  let h = harness(1).await;
  let first = h
    .send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
    .await;
  assert_eq!(first.status(), StatusCode::CREATED);
  let second = h
    .send("POST", "/enrollments", None, Some(h.enrollment("Bruno Lima", "22345678901")))
    .await;
  assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_student_is_404() {
  let h = harness(5).await;
  let resp = h.send("GET", "/enrollments/999", None, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = h.send("POST", "/enrollments/999/cancel", None, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_then_cancel_round_trip() {
  let h = harness(5).await;
  let created = json_body(
    h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
      .await,
  )
  .await;
  let student_id = created["data"]["studentId"].as_i64().unwrap();

  let detail = json_body(h.send("GET", &format!("/enrollments/{student_id}"), None, None).await).await;
  assert_eq!(detail["data"]["student"]["fullName"], "Ana Silva");
  assert_eq!(detail["data"]["student"]["status"], "ATIVO");
  assert_eq!(detail["data"]["guardians"].as_array().unwrap().len(), 1);
  assert_eq!(detail["data"]["documents"].as_array().unwrap().len(), 1);

  let resp = h
    .send("POST", &format!("/enrollments/{student_id}/cancel"), None, None)
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let cancelled = json_body(resp).await;
  assert_eq!(
    cancelled["data"]["releasedClasses"],
    json!([h.class.class_id])
  );

  let course = h.store.course(h.class.details.course_id).await.unwrap();
  assert_eq!(course.available_seats, 5);
}

#[tokio::test]
async fn update_enrollment_swaps_classes() {
  let h = harness(5).await;
  let music = h
    .store
    .add_course(NewCourse { name: "Música".into(), total_seats: 3 })
    .await
    .unwrap();
  let coral = h
    .store
    .add_class(NewClass {
      course_id:   music.course_id,
      name:        "Coral".into(),
      weekday:     "Terça".into(),
      start_time:  NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
      end_time:    NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
      term_start:  None,
      term_end:    None,
      seats:       3,
      description: None,
    })
    .await
    .unwrap();

  let created = json_body(
    h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
      .await,
  )
  .await;
  let student_id = created["data"]["studentId"].as_i64().unwrap();
  let first_id = created["data"]["enrollmentIds"][0].as_i64().unwrap();
  let uri = format!("/enrollments/{student_id}");

  let mut input = h.enrollment("Ana Silva", "123.456.789-01");
  input["classes"] = json!([{ "courseId": music.course_id, "classId": coral.class_id }]);
  input["documents"] = json!([]);
  let resp = h.send("PUT", &uri, None, Some(input)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["data"]["studentId"], student_id);
  let ids = body["data"]["enrollmentIds"].as_array().unwrap();
  assert_eq!(ids.len(), 1);
  assert_ne!(ids[0].as_i64().unwrap(), first_id);

  let detail = json_body(h.send("GET", &uri, None, None).await).await;
  let active: Vec<i64> = detail["data"]["enrollments"]
    .as_array()
    .unwrap()
    .iter()
    .filter(|e| e["status"] == "ACTIVE")
    .map(|e| e["classId"].as_i64().unwrap())
    .collect();
  assert_eq!(active, vec![coral.class_id]);
  assert_eq!(h.store.course(h.class.details.course_id).await.unwrap().available_seats, 5);
  assert_eq!(h.store.course(music.course_id).await.unwrap().available_seats, 2);

  let resp = h
    .send("PUT", &uri, None, Some(h.enrollment("Ana Silva", "99999999999")))
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["error"], "validation failed");
}

#[tokio::test]
async fn check_cpf_normalizes_input() {
  let h = harness(5).await;
  h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
    .await;

  let body = json_body(
    h.send("GET", "/enrollments/check-cpf?cpf=123.456.789-01", None, None)
      .await,
  )
  .await;
  assert_eq!(body["data"]["exists"], true);

  let body = json_body(
    h.send("GET", "/enrollments/check-cpf?cpf=00000000000", None, None)
      .await,
  )
  .await;
  assert_eq!(body["data"]["exists"], false);
}

#[tokio::test]
async fn available_courses_respects_shift() {
  let h = harness(5).await;

  let morning = json_body(
    h.send("GET", "/enrollments/available-courses?shift=morning", None, None)
      .await,
  )
  .await;
  assert_eq!(morning["data"].as_array().unwrap().len(), 1);
  assert_eq!(morning["data"][0]["classes"][0]["name"], "Robótica A");

  let afternoon = json_body(
    h.send("GET", "/enrollments/available-courses?shift=afternoon", None, None)
      .await,
  )
  .await;
  assert!(afternoon["data"].as_array().unwrap().is_empty());

  let full_day = json_body(
    h.send("GET", "/enrollments/available-courses?shift=full-day", None, None)
      .await,
  )
  .await;
  assert!(full_day["data"].as_array().unwrap().is_empty());

  let resp = h
    .send("GET", "/enrollments/available-courses?shift=night", None, None)
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Students ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_filters_by_status() {
  let h = harness(5).await;
  let created = json_body(
    h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
      .await,
  )
  .await;
  let ana = created["data"]["studentId"].as_i64().unwrap();
  h.send("POST", "/enrollments", None, Some(h.enrollment("Bruno Lima", "22345678901")))
    .await;
  h.send("POST", &format!("/enrollments/{ana}/cancel"), None, None).await;

  let active = json_body(h.send("GET", "/students?status=ATIVO", None, None).await).await;
  let active = active["data"].as_array().unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0]["fullName"], "Bruno Lima");
  assert_eq!(active[0]["courses"], json!(["Robótica"]));

  let inactive = json_body(h.send("GET", "/students?status=INATIVO", None, None).await).await;
  assert_eq!(inactive["data"][0]["fullName"], "Ana Silva");
}

// ── Attendance ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn roll_requires_caller() {
  let h = harness(5).await;
  let uri = format!("/classes/{}/roll?month=202511", h.class.class_id);
  let resp = h.send("GET", &uri, None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = h.send("GET", &uri, Some("not-a-number"), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roll_lists_mondays_and_students() {
  let h = harness(5).await;
  h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
    .await;

  let uri = format!("/classes/{}/roll?month=2025-11", h.class.class_id);
  let resp = h.send("GET", &uri, Some("7"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  let dates: Vec<&str> = body["data"]["sessions"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["date"].as_str().unwrap())
    .collect();
  assert_eq!(dates, ["2025-11-03", "2025-11-10", "2025-11-17", "2025-11-24"]);
  assert_eq!(body["data"]["month"], "2025-11");
  assert_eq!(body["data"]["created"], 4);
  assert_eq!(body["data"]["students"][0]["presences"]["2025-11-03"]["mark"], "");

  let sessions = json_body(
    h.send("GET", &format!("/classes/{}/sessions", h.class.class_id), None, None)
      .await,
  )
  .await;
  assert_eq!(sessions["data"][0]["sessionDate"], "2025-11-24");
  assert_eq!(sessions["data"][0]["recordedBy"], 7);
}

#[tokio::test]
async fn bad_month_is_400() {
  let h = harness(5).await;
  let uri = format!("/classes/{}/roll?month=2025-13", h.class.class_id);
  let resp = h.send("GET", &uri, Some("7"), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_outside_term_is_422() {
  let h = harness(5).await;
  let input = json!({ "classId": h.class.class_id, "sessionDate": "2026-01-05" });
  let resp = h.send("POST", "/sessions", Some("7"), Some(input)).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

  let input = json!({ "classId": h.class.class_id, "sessionDate": "2025-03-03" });
  let resp = h.send("POST", "/sessions", Some("7"), Some(input.clone())).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = h.send("POST", "/sessions", Some("7"), Some(input)).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn presences_flow() {
  let h = harness(5).await;
  let created = json_body(
    h.send("POST", "/enrollments", None, Some(h.enrollment("Ana Silva", "12345678901")))
      .await,
  )
  .await;
  let student_id = created["data"]["studentId"].as_i64().unwrap();

  let input = json!({ "classId": h.class.class_id, "sessionDate": "2025-03-03" });
  let session = json_body(h.send("POST", "/sessions", Some("7"), Some(input)).await).await;
  let session_id = session["data"]["sessionId"].as_i64().unwrap();
  let uri = format!("/sessions/{session_id}/presences");

  let records = json!({ "records": [{ "studentId": student_id, "mark": "P" }] });
  let summary = json_body(h.send("PUT", &uri, None, Some(records)).await).await;
  assert_eq!(summary["data"], json!({ "inserted": 1, "updated": 0 }));

  let records = json!({ "records": [{ "studentId": student_id, "mark": "", "note": "atestado" }] });
  let summary = json_body(h.send("PUT", &uri, None, Some(records)).await).await;
  assert_eq!(summary["data"], json!({ "inserted": 0, "updated": 1 }));

  let listed = json_body(h.send("GET", &uri, None, None).await).await;
  assert_eq!(listed["data"][0]["mark"], "F ");
  assert_eq!(listed["data"][0]["note"], "atestado");

  let deleted = json_body(h.send("DELETE", &uri, None, None).await).await;
  assert_eq!(deleted["data"]["deleted"], 1);

  let listed = json_body(h.send("GET", &uri, None, None).await).await;
  assert!(listed["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_session_moves_date() {
  let h = harness(5).await;
  let input = json!({ "classId": h.class.class_id, "sessionDate": "2025-03-03" });
  let session = json_body(h.send("POST", "/sessions", Some("7"), Some(input)).await).await;
  let session_id = session["data"]["sessionId"].as_i64().unwrap();

  let resp = h
    .send(
      "PUT",
      &format!("/sessions/{session_id}"),
      None,
      Some(json!({ "sessionDate": "2025-03-10" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["data"]["sessionDate"], "2025-03-10");

  let resp = h
    .send("PUT", "/sessions/999", None, Some(json!({ "sessionDate": "2025-03-10" })))
    .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
