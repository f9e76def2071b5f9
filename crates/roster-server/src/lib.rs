//! HTTP server assembly for Roster.
//!
//! Wraps the [`roster_api`] router with a health probe and request tracing,
//! and loads catalog seed files into a [`SqliteStore`].

pub mod seed;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, routing::get};
use roster_core::store::SchoolStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use roster_store_sqlite::SqliteStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the full application router for `store`.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: SchoolStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .merge(roster_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  async fn router() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    app(Arc::new(store))
  }

  async fn get_status(uri: &str) -> StatusCode {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router().await.oneshot(req).await.unwrap().status()
  }

  #[tokio::test]
  async fn health_is_ok() {
    assert_eq!(get_status("/health").await, StatusCode::OK);
  }

  #[tokio::test]
  async fn api_routes_are_mounted() {
    assert_eq!(get_status("/students").await, StatusCode::OK);
    assert_eq!(get_status("/enrollments/42").await, StatusCode::NOT_FOUND);
    assert_eq!(get_status("/nowhere").await, StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_fills_defaults() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(
        "store_path = \"~/roster.db\"\nport = 9000\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("~/roster.db"));
  }
}
