//! Handler for `GET /students`.
//!
//! Query parameters mirror [`StudentFilter`]: `name`, `cpf`, `status`
//! (`ATIVO`/`INATIVO`), `gender`, `school`, `schoolShift`, `age`, `course`,
//! `class`. All are optional and combined with AND.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use roster_core::{
  search::{StudentFilter, StudentSummary},
  store::SchoolStore,
};

use crate::{
  envelope::{Data, data},
  error::ApiError,
};

/// `GET /students[?name=..&status=..]`
pub async fn search<S: SchoolStore>(
  State(store): State<Arc<S>>,
  params: Result<Query<StudentFilter>, QueryRejection>,
) -> Result<Json<Data<Vec<StudentSummary>>>, ApiError> {
  let Query(filter) = params?;
  let students = store
    .search_students(&filter)
    .await
    .map_err(ApiError::store)?;
  Ok(data(students))
}
