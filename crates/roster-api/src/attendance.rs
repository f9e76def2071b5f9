//! Handlers for class sessions, the monthly roll and presence records.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/classes/{class_id}/roll` | `?month=YYYYMM`; creates missing sessions; needs caller |
//! | `GET`    | `/classes/{class_id}/sessions` | newest first |
//! | `POST`   | `/sessions` | 201; needs caller |
//! | `PUT`    | `/sessions/{session_id}` | partial update |
//! | `GET`    | `/sessions/{session_id}/presences` | |
//! | `PUT`    | `/sessions/{session_id}/presences` | body: `{"records":[...]}` |
//! | `DELETE` | `/sessions/{session_id}/presences` | irreversible |

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
  attendance::{
    AttendanceRoll, ClassSession, NewSession, PresenceInput, PresenceRecord,
    SessionPatch, UpsertSummary,
  },
  schedule::YearMonth,
  store::SchoolStore,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  caller::Caller,
  envelope::{Data, data},
  error::ApiError,
};

// ─── Roll ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RollParams {
  pub month: String,
}

/// `GET /classes/{class_id}/roll?month=<YYYYMM>`
///
/// Not a pure read: sessions missing for the month are created and
/// attributed to the caller.
pub async fn roll<S: SchoolStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  path: Result<Path<i64>, PathRejection>,
  params: Result<Query<RollParams>, QueryRejection>,
) -> Result<Json<Data<AttendanceRoll>>, ApiError> {
  let Path(class_id) = path?;
  let Query(params) = params?;
  let month: YearMonth = params.month.parse().map_err(ApiError::store)?;
  debug!(class_id, %month, user_id = caller.user_id, username = ?caller.username, "roll requested");
  let roll = store
    .attendance_roll(class_id, month, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(data(roll))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// `GET /classes/{class_id}/sessions`
pub async fn list_sessions<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Data<Vec<ClassSession>>>, ApiError> {
  let Path(class_id) = path?;
  let sessions = store.list_sessions(class_id).await.map_err(ApiError::store)?;
  Ok(data(sessions))
}

/// `POST /sessions`
pub async fn create_session<S: SchoolStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  body: Result<Json<NewSession>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let session = store
    .create_session(input, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, data(session)))
}

/// `PUT /sessions/{session_id}`
pub async fn update_session<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<SessionPatch>, JsonRejection>,
) -> Result<Json<Data<ClassSession>>, ApiError> {
  let Path(session_id) = path?;
  let Json(patch) = body?;
  let session = store
    .update_session(session_id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(data(session))
}

// ─── Presences ───────────────────────────────────────────────────────────────

/// `GET /sessions/{session_id}/presences`
pub async fn get_presences<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Data<Vec<PresenceRecord>>>, ApiError> {
  let Path(session_id) = path?;
  let records = store.get_presences(session_id).await.map_err(ApiError::store)?;
  Ok(data(records))
}

#[derive(Debug, Deserialize)]
pub struct PresenceBatch {
  pub records: Vec<PresenceInput>,
}

/// `PUT /sessions/{session_id}/presences`
pub async fn upsert_presences<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<PresenceBatch>, JsonRejection>,
) -> Result<Json<Data<UpsertSummary>>, ApiError> {
  let Path(session_id) = path?;
  let Json(batch) = body?;
  let summary = store
    .upsert_presences(session_id, batch.records)
    .await
    .map_err(ApiError::store)?;
  Ok(data(summary))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub deleted: usize,
}

/// `DELETE /sessions/{session_id}/presences`
pub async fn delete_presences<S: SchoolStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Data<Deleted>>, ApiError> {
  let Path(session_id) = path?;
  let deleted = store
    .delete_presences(session_id)
    .await
    .map_err(ApiError::store)?;
  Ok(data(Deleted { deleted }))
}
