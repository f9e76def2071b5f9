//! Handlers for `/enrollments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/enrollments` | 201; documents recorded after commit |
//! | `GET`  | `/enrollments/check-cpf` | `?cpf=` |
//! | `GET`  | `/enrollments/available-courses` | `?shift=morning\|afternoon\|full-day` |
//! | `GET`  | `/enrollments/{student_id}` | 404 if not found |
//! | `PUT`  | `/enrollments/{student_id}` | replaces guardians and classes |
//! | `POST` | `/enrollments/{student_id}/cancel` | idempotent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  attachment::{Attachment, AttachmentOwner, DocumentInput},
  catalog::CourseOption,
  enrollment::{Cancellation, EnrollmentDetail, EnrollmentReceipt, NewEnrollment},
  store::SchoolStore,
  student::SchoolShift,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  envelope::{Data, data},
  error::ApiError,
};

/// A committed enrollment together with the documents recorded for it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSaved {
  #[serde(flatten)]
  pub receipt:   EnrollmentReceipt,
  pub documents: Vec<Attachment>,
}

/// Record `documents` against the student. Runs after the enrollment has
/// committed, so a failure here is logged and otherwise ignored.
async fn record_documents<S: SchoolStore>(
  store: &S,
  student_id: i64,
  documents: Vec<DocumentInput>,
) -> Vec<Attachment> {
  match store
    .attach_documents(AttachmentOwner::enrollment(student_id), documents)
    .await
  {
    Ok(attached) => attached,
    Err(e) => {
      warn!(student_id, error = %e, "failed to record enrollment documents");
      Vec::new()
    }
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /enrollments`
pub async fn create<S: SchoolStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewEnrollment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(mut input) = body?;
  let documents = std::mem::take(&mut input.documents);
  let receipt = store.create_enrollment(input).await.map_err(ApiError::store)?;
  let documents = record_documents(&*store, receipt.student_id, documents).await;
  Ok((StatusCode::CREATED, data(EnrollmentSaved { receipt, documents })))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /enrollments/{student_id}`
pub async fn get_one<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Data<EnrollmentDetail>>, ApiError> {
  let Path(student_id) = path?;
  let detail = store
    .get_enrollment(student_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {student_id} not found")))?;
  Ok(data(detail))
}

#[derive(Debug, Deserialize)]
pub struct CpfParams {
  pub cpf: String,
}

#[derive(Debug, Serialize)]
pub struct CpfCheck {
  pub exists: bool,
}

/// `GET /enrollments/check-cpf?cpf=<cpf>`
pub async fn check_cpf<S: SchoolStore>(
  State(store): State<Arc<S>>,
  params: Result<Query<CpfParams>, QueryRejection>,
) -> Result<Json<Data<CpfCheck>>, ApiError> {
  let Query(params) = params?;
  let exists = store.cpf_exists(&params.cpf).await.map_err(ApiError::store)?;
  Ok(data(CpfCheck { exists }))
}

#[derive(Debug, Deserialize)]
pub struct ShiftParams {
  pub shift: Option<SchoolShift>,
}

/// `GET /enrollments/available-courses[?shift=<shift>]`
pub async fn available_courses<S: SchoolStore>(
  State(store): State<Arc<S>>,
  params: Result<Query<ShiftParams>, QueryRejection>,
) -> Result<Json<Data<Vec<CourseOption>>>, ApiError> {
  let Query(params) = params?;
  let courses = store
    .available_courses(params.shift)
    .await
    .map_err(ApiError::store)?;
  Ok(data(courses))
}

// ─── Update / cancel ─────────────────────────────────────────────────────────

/// `PUT /enrollments/{student_id}`
pub async fn update<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<NewEnrollment>, JsonRejection>,
) -> Result<Json<Data<EnrollmentSaved>>, ApiError> {
  let Path(student_id) = path?;
  let Json(mut input) = body?;
  let documents = std::mem::take(&mut input.documents);
  let receipt = store
    .update_enrollment(student_id, input)
    .await
    .map_err(ApiError::store)?;
  let documents = record_documents(&*store, student_id, documents).await;
  Ok(data(EnrollmentSaved { receipt, documents }))
}

/// `POST /enrollments/{student_id}/cancel`
pub async fn cancel<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Data<Cancellation>>, ApiError> {
  let Path(student_id) = path?;
  let cancellation = store
    .cancel_enrollment(student_id)
    .await
    .map_err(ApiError::store)?;
  Ok(data(cancellation))
}
