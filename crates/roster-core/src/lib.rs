//! Core types and trait definitions for the Roster school backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It holds the domain model, validation, the pure parts of the enrollment
//! and attendance logic, and the [`store::SchoolStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attachment;
pub mod attendance;
pub mod catalog;
pub mod enrollment;
pub mod error;
pub mod schedule;
pub mod search;
pub mod store;
pub mod student;

pub use error::{Classify, Error, ErrorKind, Result};
