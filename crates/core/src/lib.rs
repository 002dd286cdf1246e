//! Domain layer for Bistro, a restaurant discovery and review service.
//!
//! This crate is storage agnostic. It holds the domain models, the repository
//! traits implemented by `bistro-storage`, and the replication engine that
//! keeps the local store and the remote system of record in step.

pub mod clients;
pub mod errors;
pub mod favorites;
pub mod reports;
pub mod restaurants;
pub mod reviews;
pub mod sync;
pub mod tags;

pub use errors::{DatabaseError, Error, Result, RetryClass, ValidationError};
