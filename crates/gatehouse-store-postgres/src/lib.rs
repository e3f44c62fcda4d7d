//! PostgreSQL backend for Gatehouse.
//!
//! Backed by an [`sqlx::PgPool`]. Every store call checks a connection out of
//! the pool for the duration of one statement and returns it when the call
//! finishes, whether it succeeded or not.

mod rows;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::PgStore;

#[cfg(test)]
mod tests;
