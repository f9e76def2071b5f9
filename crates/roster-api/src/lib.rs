//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::SchoolStore`].
//! Authentication happens upstream; handlers that attribute work read the
//! caller from the headers the gateway sets (see [`caller`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(roster_api::api_router(store.clone()))
//! ```

pub mod attendance;
pub mod caller;
pub mod enrollments;
pub mod envelope;
pub mod error;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use roster_core::store::SchoolStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SchoolStore + 'static,
{
  Router::new()
    // Enrollments
    .route("/enrollments", post(enrollments::create::<S>))
    .route("/enrollments/check-cpf", get(enrollments::check_cpf::<S>))
    .route(
      "/enrollments/available-courses",
      get(enrollments::available_courses::<S>),
    )
    .route(
      "/enrollments/{student_id}",
      get(enrollments::get_one::<S>).put(enrollments::update::<S>),
    )
    .route("/enrollments/{student_id}/cancel", post(enrollments::cancel::<S>))
    // Students
    .route("/students", get(students::search::<S>))
    // Attendance
    .route("/classes/{class_id}/roll", get(attendance::roll::<S>))
    .route("/classes/{class_id}/sessions", get(attendance::list_sessions::<S>))
    .route("/sessions", post(attendance::create_session::<S>))
    .route("/sessions/{session_id}", put(attendance::update_session::<S>))
    .route(
      "/sessions/{session_id}/presences",
      get(attendance::get_presences::<S>)
        .put(attendance::upsert_presences::<S>)
        .delete(attendance::delete_presences::<S>),
    )
    .with_state(store)
}

#[cfg(test)]
mod tests;
