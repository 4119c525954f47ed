//! [`DriveStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use sgc_core::{
  drive::{
    DriveFile, Folder, FolderContents, NewFile, NewFolder, file_url,
    normalize_name,
  },
  store::DriveStore,
};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    FILE_COLUMNS, FOLDER_COLUMNS, RawFile, RawFolder, content_hash, encode_dt,
    encode_uuid,
  },
};

const DEFAULT_MIME: &str = "application/octet-stream";

// ─── Connection-level helpers ────────────────────────────────────────────────

pub(crate) fn folder_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM folders WHERE folder_id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn select_folder(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawFolder>> {
  conn
    .query_row(
      &format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE folder_id = ?1"),
      [id],
      RawFolder::from_row,
    )
    .optional()
}

fn select_sibling(
  conn:   &Connection,
  parent: Option<&str>,
  name:   &str,
) -> rusqlite::Result<Option<RawFolder>> {
  conn
    .query_row(
      &format!(
        "SELECT {FOLDER_COLUMNS} FROM folders
         WHERE COALESCE(parent_id, '') = COALESCE(?1, '') AND name = ?2"
      ),
      rusqlite::params![parent, name],
      RawFolder::from_row,
    )
    .optional()
}

/// Insert a folder unless a sibling already has its name. Returns the
/// number of rows written (0 or 1).
fn insert_folder(conn: &Connection, row: &RawFolder) -> rusqlite::Result<usize> {
  conn.execute(
    "INSERT INTO folders (folder_id, name, parent_id, created_at, created_by)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT DO NOTHING",
    rusqlite::params![
      row.folder_id,
      row.name,
      row.parent_id,
      row.created_at,
      row.created_by,
    ],
  )
}

fn folder_row(input: NewFolder) -> Result<RawFolder> {
  Ok(RawFolder {
    folder_id:  encode_uuid(Uuid::new_v4()),
    name:       normalize_name(&input.name)?,
    parent_id:  input.parent_id.map(encode_uuid),
    created_at: encode_dt(Utc::now()),
    created_by: input.created_by,
  })
}

/// Outcome of a write whose failure modes are decided inside the
/// connection closure.
enum Write<T> {
  Done(T),
  Missing,
  Duplicate,
}

// ─── DriveStore impl ─────────────────────────────────────────────────────────

impl DriveStore for SqliteStore {
  async fn list_contents(&self, folder_id: Option<Uuid>) -> Result<FolderContents> {
    let id_str = folder_id.map(encode_uuid);

    let listing = self
      .conn
      .call(move |conn| {
        let folder = match id_str.as_deref() {
          Some(id) => match select_folder(conn, id)? {
            Some(f) => Some(f),
            None => return Ok(None),
          },
          None => None,
        };

        let folders = conn
          .prepare(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE parent_id IS ?1 ORDER BY name"
          ))?
          .query_map([id_str.as_deref()], RawFolder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let files = match id_str.as_deref() {
          Some(id) => conn
            .prepare(&format!(
              "SELECT {FILE_COLUMNS} FROM files WHERE folder_id = ?1 ORDER BY name"
            ))?
            .query_map([id], RawFile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => Vec::new(),
        };

        Ok(Some((folder, folders, files)))
      })
      .await?;

    let Some((folder, folders, files)) = listing else {
      return Err(sgc_core::Error::FolderNotFound(folder_id.unwrap_or_default()).into());
    };

    Ok(FolderContents {
      folder:  folder.map(RawFolder::into_folder).transpose()?,
      folders: folders
        .into_iter()
        .map(RawFolder::into_folder)
        .collect::<Result<_>>()?,
      files:   files.into_iter().map(RawFile::into_file).collect::<Result<_>>()?,
    })
  }

  async fn get_folder(&self, folder_id: Uuid) -> Result<Option<Folder>> {
    let id_str = encode_uuid(folder_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_folder(conn, &id_str)?))
      .await?;
    raw.map(RawFolder::into_folder).transpose()
  }

  async fn create_folder(&self, input: NewFolder) -> Result<Folder> {
    let parent_id = input.parent_id;
    let row = folder_row(input)?;
    let name = row.name.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        if let Some(parent) = row.parent_id.as_deref()
          && !folder_exists(conn, parent)?
        {
          return Ok(Write::Missing);
        }
        if insert_folder(conn, &row)? == 0 {
          return Ok(Write::Duplicate);
        }
        Ok(Write::Done(row))
      })
      .await?;

    match outcome {
      Write::Done(row) => row.into_folder(),
      Write::Missing => Err(
        sgc_core::Error::FolderNotFound(parent_id.unwrap_or_default()).into(),
      ),
      Write::Duplicate => Err(sgc_core::Error::FolderExists(name).into()),
    }
  }

  async fn find_or_create_folder(&self, input: NewFolder) -> Result<Folder> {
    let parent_id = input.parent_id;
    let row = folder_row(input)?;

    let outcome = self
      .conn
      .call(move |conn| {
        if let Some(parent) = row.parent_id.as_deref()
          && !folder_exists(conn, parent)?
        {
          return Ok(None);
        }
        insert_folder(conn, &row)?;
        select_sibling(conn, row.parent_id.as_deref(), &row.name).map_err(Into::into)
      })
      .await?;

    outcome
      .ok_or_else(|| {
        Error::from(sgc_core::Error::FolderNotFound(parent_id.unwrap_or_default()))
      })?
      .into_folder()
  }

  async fn rename_folder(&self, folder_id: Uuid, name: String) -> Result<Folder> {
    let name = normalize_name(&name)?;
    let id_str = encode_uuid(folder_id);
    let new_name = name.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let Some(mut current) = select_folder(conn, &id_str)? else {
          return Ok(Write::Missing);
        };
        if let Some(sibling) =
          select_sibling(conn, current.parent_id.as_deref(), &new_name)?
          && sibling.folder_id != current.folder_id
        {
          return Ok(Write::Duplicate);
        }
        conn.execute(
          "UPDATE folders SET name = ?2 WHERE folder_id = ?1",
          rusqlite::params![id_str, new_name],
        )?;
        current.name = new_name;
        Ok(Write::Done(current))
      })
      .await?;

    match outcome {
      Write::Done(row) => row.into_folder(),
      Write::Missing => Err(sgc_core::Error::FolderNotFound(folder_id).into()),
      Write::Duplicate => Err(sgc_core::Error::FolderExists(name).into()),
    }
  }

  async fn delete_folder(&self, folder_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(folder_id);
    // Descendant folders, files and contents go with it via ON DELETE CASCADE.
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM folders WHERE folder_id = ?1", [id_str])?)
      })
      .await?;

    if deleted == 0 {
      return Err(sgc_core::Error::FolderNotFound(folder_id).into());
    }
    Ok(())
  }

  async fn folder_path(&self, folder_id: Uuid) -> Result<Vec<Folder>> {
    let id_str = encode_uuid(folder_id);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "WITH RECURSIVE chain(folder_id, name, parent_id, created_at, created_by, depth) AS (
             SELECT folder_id, name, parent_id, created_at, created_by, 0
             FROM folders WHERE folder_id = ?1
             UNION ALL
             SELECT f.folder_id, f.name, f.parent_id, f.created_at, f.created_by, c.depth + 1
             FROM folders f JOIN chain c ON f.folder_id = c.parent_id
           )
           SELECT folder_id, name, parent_id, created_at, created_by
           FROM chain ORDER BY depth DESC",
        )?;
        let rows = stmt
          .query_map([id_str], RawFolder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.is_empty() {
      return Err(sgc_core::Error::FolderNotFound(folder_id).into());
    }
    raws.into_iter().map(RawFolder::into_folder).collect()
  }

  async fn upload_file(&self, input: NewFile) -> Result<DriveFile> {
    let file_id = Uuid::new_v4();
    let mime_type = match input.mime_type.trim() {
      "" => DEFAULT_MIME.to_owned(),
      m => m.to_owned(),
    };
    let file = DriveFile {
      file_id,
      folder_id: input.folder_id,
      name: normalize_name(&input.name)?,
      mime_type,
      size: input.content.len() as u64,
      content_hash: content_hash(&input.content),
      url: file_url(file_id),
      created_at: Utc::now(),
    };

    let file_id_str   = encode_uuid(file.file_id);
    let folder_id_str = encode_uuid(file.folder_id);
    let name          = file.name.clone();
    let mime          = file.mime_type.clone();
    let size          = input.content.len() as i64;
    let hash          = file.content_hash.clone();
    let at_str        = encode_dt(file.created_at);
    let content       = input.content;

    let stored = self
      .conn
      .call(move |conn| {
        if !folder_exists(conn, &folder_id_str)? {
          return Ok(false);
        }
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO files (
             file_id, folder_id, name, mime_type, size, content_hash, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![file_id_str, folder_id_str, name, mime, size, hash, at_str],
        )?;
        tx.execute(
          "INSERT INTO file_contents (file_id, content) VALUES (?1, ?2)",
          rusqlite::params![file_id_str, content],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !stored {
      return Err(sgc_core::Error::FolderNotFound(file.folder_id).into());
    }
    Ok(file)
  }

  async fn get_file(&self, file_id: Uuid) -> Result<Option<DriveFile>> {
    let id_str = encode_uuid(file_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FILE_COLUMNS} FROM files WHERE file_id = ?1"),
              [id_str],
              RawFile::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawFile::into_file).transpose()
  }

  async fn download_file(&self, file_id: Uuid) -> Result<Option<(DriveFile, Vec<u8>)>> {
    let id_str = encode_uuid(file_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT f.file_id, f.folder_id, f.name, f.mime_type, f.size,
                      f.content_hash, f.created_at, c.content
               FROM files f JOIN file_contents c ON c.file_id = f.file_id
               WHERE f.file_id = ?1",
              [id_str],
              |row| Ok((RawFile::from_row(row)?, row.get::<_, Vec<u8>>(7)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(file, content)| Ok((file.into_file()?, content)))
      .transpose()
  }

  async fn delete_file(&self, file_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(file_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM files WHERE file_id = ?1", [id_str])?)
      })
      .await?;

    if deleted == 0 {
      return Err(sgc_core::Error::FileNotFound(file_id).into());
    }
    Ok(())
  }
}
