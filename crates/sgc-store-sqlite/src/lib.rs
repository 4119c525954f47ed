//! SQLite backend for the SGC store traits.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Drive file contents are stored as
//! BLOBs next to their metadata.

mod acpm;
mod card;
mod certificate;
mod drive;
mod encode;
mod report;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
