//! Success bodies are wrapped as `{"data": ...}`.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub data: T,
}

pub fn data<T: Serialize>(value: T) -> Json<Data<T>> { Json(Data { data: value }) }
