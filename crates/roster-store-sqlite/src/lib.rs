//! SQLite backend for the Roster school store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutating operation is a single
//! SQLite transaction.

mod attendance;
mod encode;
mod enrollment;
mod ledger;
mod schema;
mod search;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
