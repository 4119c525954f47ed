//! Handlers for `/acpm` endpoints (corrective, preventive and improvement
//! actions).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/acpm` | Optional `status`, `kind`, `responsible`, `report_id`, `overdue=true` |
//! | `POST` | `/acpm` | Body: [`NewAcpm`]; 201 |
//! | `GET`  | `/acpm/:id` | 404 if not found |
//! | `PUT`  | `/acpm/:id` | Body: [`AcpmUpdate`]; 422 once closed |
//! | `PUT`  | `/acpm/:id/estado` | Body: [`AcpmTransition`]; 422 on a forbidden move or missing evidence |
//! | `POST` | `/acpm/:id/evidencia` | Multipart `file`; returns `{url, file}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sgc_core::{
  acpm::{
    Acpm, AcpmKind, AcpmQuery, AcpmStatus, AcpmTransition, AcpmUpdate, NewAcpm,
  },
  drive::{DriveFile, NewFile, ensure_path},
  store::{AcpmStore, DriveStore},
};
use uuid::Uuid;

use crate::{
  error::ApiError,
  upload::{Upload, drive_safe},
};

/// Drive folder that holds every ACPM's evidence, one subfolder per ACPM.
pub const EVIDENCE_PATH: [&str; 2] = ["ACPM", "Evidencias"];

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:      Option<AcpmStatus>,
  pub kind:        Option<AcpmKind>,
  pub responsible: Option<String>,
  pub report_id:   Option<Uuid>,
  /// Only open or in-progress ACPMs past their due date.
  #[serde(default)]
  pub overdue:     bool,
}

/// `GET /acpm`
pub async fn list<S: AcpmStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Acpm>>, ApiError> {
  let query = AcpmQuery {
    status:      params.status,
    kind:        params.kind,
    responsible: params.responsible.filter(|r| !r.trim().is_empty()),
    report_id:   params.report_id,
    overdue_on:  params.overdue.then(|| Utc::now().date_naive()),
  };
  let acpms = store.list_acpms(&query).await.map_err(ApiError::store)?;
  Ok(Json(acpms))
}

// ─── Create / get / edit ─────────────────────────────────────────────────────

/// `POST /acpm`: returns 201 + the stored ACPM.
pub async fn create<S: AcpmStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewAcpm>,
) -> Result<impl IntoResponse, ApiError> {
  let acpm = store.create_acpm(body).await.map_err(ApiError::store)?;
  tracing::info!(acpm_id = %acpm.acpm_id, kind = ?acpm.kind, "acpm created");
  Ok((StatusCode::CREATED, Json(acpm)))
}

/// `GET /acpm/:id`
pub async fn get_one<S: AcpmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Acpm>, ApiError> {
  let acpm = store
    .get_acpm(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("acpm {id} not found")))?;
  Ok(Json(acpm))
}

/// `PUT /acpm/:id`
pub async fn update<S: AcpmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AcpmUpdate>,
) -> Result<Json<Acpm>, ApiError> {
  let acpm = store.update_acpm(id, body).await.map_err(ApiError::store)?;
  tracing::info!(acpm_id = %id, "acpm updated");
  Ok(Json(acpm))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// `PUT /acpm/:id/estado`
pub async fn transition<S: AcpmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AcpmTransition>,
) -> Result<Json<Acpm>, ApiError> {
  let acpm = store
    .transition_acpm(id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(acpm_id = %id, status = %acpm.status, "acpm status changed");
  Ok(Json(acpm))
}

#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
  pub url:  String,
  pub file: DriveFile,
}

/// `POST /acpm/:id/evidencia`: stores the file under
/// `ACPM/Evidencias/<id>` and returns its URL for the closing transition.
pub async fn upload_evidence<S: AcpmStore + DriveStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<(StatusCode, Json<EvidenceResponse>), ApiError> {
  let acpm = store
    .get_acpm(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("acpm {id} not found")))?;
  if acpm.status == AcpmStatus::Closed {
    return Err(sgc_core::Error::AcpmClosed(id).into());
  }

  let file = Upload::read(multipart).await?.require_file()?;
  let id_segment = id.to_string();
  let folder = ensure_path(
    store.as_ref(),
    None,
    [EVIDENCE_PATH[0], EVIDENCE_PATH[1], id_segment.as_str()],
  )
  .await
  .map_err(ApiError::store)?;

  let stored = store
    .upload_file(NewFile {
      folder_id: folder.folder_id,
      name:      drive_safe(&file.name),
      mime_type: file.mime_type,
      content:   file.content,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(acpm_id = %id, file_id = %stored.file_id, "acpm evidence uploaded");

  Ok((
    StatusCode::CREATED,
    Json(EvidenceResponse { url: stored.url.clone(), file: stored }),
  ))
}
