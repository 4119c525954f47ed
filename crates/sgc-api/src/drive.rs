//! Handlers for `/drive` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/drive/contenido` | Top-level folders |
//! | `GET`    | `/drive/contenido/:id` | Folder, its subfolders and files |
//! | `POST`   | `/drive/carpeta` | Body: [`FolderBody`]; 201, 409 on a name clash |
//! | `POST`   | `/drive/carpeta/buscar-o-crear` | Body: [`FolderBody`]; existing or new folder |
//! | `PUT`    | `/drive/carpeta/:id` | Body: `{"name":"..."}` |
//! | `DELETE` | `/drive/carpeta/:id` | Deletes descendants too; 204 |
//! | `GET`    | `/drive/carpeta/:id/ruta` | Breadcrumbs, top level first |
//! | `POST`   | `/drive/archivo` | Multipart: `folder_id` + `file`; 201 |
//! | `GET`    | `/drive/archivo/:id` | Raw bytes; honours `If-None-Match` |
//! | `DELETE` | `/drive/archivo/:id` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use sgc_core::{
  drive::{DriveFile, Folder, FolderContents, NewFile, NewFolder},
  store::DriveStore,
};
use uuid::Uuid;

use crate::{
  error::ApiError,
  upload::{Upload, file_response},
};

// ─── Listing ─────────────────────────────────────────────────────────────────

/// `GET /drive/contenido`
pub async fn list_root<S: DriveStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<FolderContents>, ApiError> {
  let contents = store.list_contents(None).await.map_err(ApiError::store)?;
  Ok(Json(contents))
}

/// `GET /drive/contenido/:id`
pub async fn list_folder<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FolderContents>, ApiError> {
  let contents = store.list_contents(Some(id)).await.map_err(ApiError::store)?;
  Ok(Json(contents))
}

/// `GET /drive/carpeta/:id/ruta`
pub async fn folder_path<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Folder>>, ApiError> {
  let path = store.folder_path(id).await.map_err(ApiError::store)?;
  Ok(Json(path))
}

// ─── Folders ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /drive/carpeta` and its find-or-create twin.
#[derive(Debug, Deserialize)]
pub struct FolderBody {
  pub name:       String,
  #[serde(default)]
  pub parent_id:  Option<Uuid>,
  #[serde(default)]
  pub created_by: Option<String>,
}

impl From<FolderBody> for NewFolder {
  fn from(b: FolderBody) -> Self {
    NewFolder { name: b.name, parent_id: b.parent_id, created_by: b.created_by }
  }
}

/// `POST /drive/carpeta`: returns 201 + the new folder.
pub async fn create_folder<S: DriveStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<FolderBody>,
) -> Result<impl IntoResponse, ApiError> {
  let folder = store
    .create_folder(body.into())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(folder_id = %folder.folder_id, name = %folder.name, "folder created");
  Ok((StatusCode::CREATED, Json(folder)))
}

/// `POST /drive/carpeta/buscar-o-crear`
pub async fn find_or_create_folder<S: DriveStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<FolderBody>,
) -> Result<Json<Folder>, ApiError> {
  let folder = store
    .find_or_create_folder(body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(folder))
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub name: String,
}

/// `PUT /drive/carpeta/:id`
pub async fn rename_folder<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RenameBody>,
) -> Result<Json<Folder>, ApiError> {
  let folder = store
    .rename_folder(id, body.name)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(folder_id = %id, name = %folder.name, "folder renamed");
  Ok(Json(folder))
}

/// `DELETE /drive/carpeta/:id`
pub async fn delete_folder<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_folder(id).await.map_err(ApiError::store)?;
  tracing::info!(folder_id = %id, "folder deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// `POST /drive/archivo`: multipart `folder_id` + `file`; returns 201.
pub async fn upload<S: DriveStore>(
  State(store): State<Arc<S>>,
  multipart: Multipart,
) -> Result<(StatusCode, Json<DriveFile>), ApiError> {
  let mut upload = Upload::read(multipart).await?;
  let folder_id = upload
    .fields
    .get("folder_id")
    .ok_or_else(|| ApiError::BadRequest("missing multipart field \"folder_id\"".into()))?
    .trim()
    .parse::<Uuid>()
    .map_err(|e| ApiError::BadRequest(format!("invalid folder_id: {e}")))?;
  let file = upload.require_file()?;

  let stored = store
    .upload_file(NewFile {
      folder_id,
      name: file.name,
      mime_type: file.mime_type,
      content: file.content,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    file_id = %stored.file_id,
    %folder_id,
    size = stored.size,
    "file uploaded"
  );
  Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /drive/archivo/:id`
pub async fn download<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let (file, content) = store
    .download_file(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;
  Ok(file_response(
    &file,
    content,
    headers.get(header::IF_NONE_MATCH),
    "attachment",
  ))
}

/// `DELETE /drive/archivo/:id`
pub async fn delete_file<S: DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_file(id).await.map_err(ApiError::store)?;
  tracing::info!(file_id = %id, "file deleted");
  Ok(StatusCode::NO_CONTENT)
}
