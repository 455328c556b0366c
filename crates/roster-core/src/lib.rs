//! Core types and trait definitions for the Roster person store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PersonStore`]; the HTTP layer drives
//! them through [`manager::VersionManager`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod manager;
pub mod person;
pub mod store;

pub use error::{Error, Result};
