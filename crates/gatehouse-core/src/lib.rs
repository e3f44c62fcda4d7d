//! Core types and trait definitions for Gatehouse.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the session model, the access guards, the record types and the
//! [`DashboardStore`](store::DashboardStore) abstraction that storage
//! backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod entry;
pub mod error;
pub mod guard;
pub mod identity;
pub mod profile;
pub mod recorder;
pub mod session;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testing;
