//! Core types and trait definitions for the SGC quality-management service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod acpm;
pub mod card;
pub mod certificate;
pub mod drive;
pub mod error;
pub mod report;
pub mod store;
pub mod template;

pub use error::{DomainError, Error, ErrorClass, Result};
