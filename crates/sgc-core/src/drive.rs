//! The drive: an in-app virtual filesystem whose folders and files are
//! database rows rather than filesystem entries.
//!
//! Every module's documentation tab, ACPM evidence and generated certificates
//! end up here, usually located through [`ensure_path`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::DriveStore};

// ─── Folders ─────────────────────────────────────────────────────────────────

/// A node of the folder tree. Top-level folders have no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
  pub folder_id:  Uuid,
  pub name:       String,
  pub parent_id:  Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub created_by: Option<String>,
}

/// Input to [`DriveStore::create_folder`] and
/// [`DriveStore::find_or_create_folder`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFolder {
  pub name:       String,
  #[serde(default)]
  pub parent_id:  Option<Uuid>,
  #[serde(default)]
  pub created_by: Option<String>,
}

impl NewFolder {
  pub fn new(name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
    Self { name: name.into(), parent_id, created_by: None }
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// Metadata for a stored document. The bytes live in a separate table and
/// are only read by [`DriveStore::download_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
  pub file_id:      Uuid,
  pub folder_id:    Uuid,
  pub name:         String,
  pub mime_type:    String,
  pub size:         u64,
  /// SHA-256 hex digest of the content; doubles as the download ETag.
  pub content_hash: String,
  pub url:          String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`DriveStore::upload_file`].
#[derive(Debug, Clone)]
pub struct NewFile {
  pub folder_id: Uuid,
  pub name:      String,
  pub mime_type: String,
  pub content:   Vec<u8>,
}

/// Relative URL under which a file's content is served.
pub fn file_url(file_id: Uuid) -> String { format!("/drive/archivo/{file_id}") }

// ─── Listings ────────────────────────────────────────────────────────────────

/// The children of one folder (or of the top level, where `folder` is
/// `None`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContents {
  pub folder:  Option<Folder>,
  pub folders: Vec<Folder>,
  pub files:   Vec<DriveFile>,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Trim a folder or file name and reject names that cannot be shown in a
/// breadcrumb.
pub fn normalize_name(raw: &str) -> Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(Error::Validation("name must not be empty".into()));
  }
  if name.contains('/') || name.contains('\\') {
    return Err(Error::Validation(format!(
      "name {name:?} must not contain path separators"
    )));
  }
  Ok(name.to_owned())
}

/// Walk `names` below `parent`, finding or creating each segment in turn.
/// Returns the deepest folder.
pub async fn ensure_path<S, I, N>(
  store: &S,
  parent: Option<Uuid>,
  names: I,
) -> Result<Folder, S::Error>
where
  S: DriveStore,
  I: IntoIterator<Item = N>,
  I::IntoIter: Send,
  N: AsRef<str> + Send,
{
  let mut current: Option<Folder> = None;
  let mut parent_id = parent;
  for name in names {
    let folder = store
      .find_or_create_folder(NewFolder::new(name.as_ref(), parent_id))
      .await?;
    parent_id = Some(folder.folder_id);
    current = Some(folder);
  }
  current.ok_or_else(|| Error::Validation("empty folder path".into()).into())
}
