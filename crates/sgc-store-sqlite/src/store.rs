//! [`SqliteStore`]: the SQLite implementation of the SGC store traits.
//!
//! The trait impls live in one module per area (`drive`, `acpm`, `report`,
//! `certificate`, `card`); this module owns the connection.

use std::path::Path;

use sgc_core::store::Store;

use crate::{Error, Result, schema::SCHEMA};

/// Folders, files, ACPMs, reports, certificates and cards in one SQLite
/// database. Clones share the connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database file at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(tokio_rusqlite::Connection::open(path).await?).await
  }

  /// A private in-memory database; every call yields a fresh, empty store.
  pub async fn open_in_memory() -> Result<Self> {
    Self::init(tokio_rusqlite::Connection::open_in_memory().await?).await
  }

  /// Apply the schema and pragmas before the connection is handed out.
  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }
}

impl Store for SqliteStore {
  type Error = Error;
}
