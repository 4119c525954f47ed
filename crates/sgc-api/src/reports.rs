//! Handlers for `/reportes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reportes` | Optional `?category=` |
//! | `POST`   | `/reportes` | Body: [`NewReport`]; 201 |
//! | `GET`    | `/reportes/:id` | 404 if not found |
//! | `DELETE` | `/reportes/:id` | 204 |
//! | `POST`   | `/reportes/:id/verificar` | Marks the report verified |
//! | `POST`   | `/reportes/:id/acpm` | Body: [`NewAcpm`]; 201 + the linked ACPM, 409 if already escalated |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use sgc_core::{
  acpm::{Acpm, NewAcpm},
  report::{NewReport, Report},
  store::ReportStore,
};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category: Option<String>,
}

/// `GET /reportes[?category=<category>]`
pub async fn list<S: ReportStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Report>>, ApiError> {
  let category = params.category.filter(|c| !c.trim().is_empty());
  let reports = store.list_reports(category).await.map_err(ApiError::store)?;
  Ok(Json(reports))
}

/// `POST /reportes`: returns 201 + the stored report.
pub async fn create<S: ReportStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewReport>,
) -> Result<impl IntoResponse, ApiError> {
  let report = store.create_report(body).await.map_err(ApiError::store)?;
  tracing::info!(
    report_id = %report.report_id,
    category = %report.category,
    passed = report.passed,
    "report created"
  );
  Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /reportes/:id`
pub async fn get_one<S: ReportStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
  let report = store
    .get_report(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("report {id} not found")))?;
  Ok(Json(report))
}

/// `DELETE /reportes/:id`
pub async fn delete<S: ReportStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_report(id).await.map_err(ApiError::store)?;
  tracing::info!(report_id = %id, "report deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /reportes/:id/verificar`
pub async fn verify<S: ReportStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
  let report = store.verify_report(id).await.map_err(ApiError::store)?;
  tracing::info!(report_id = %id, "report verified");
  Ok(Json(report))
}

/// `POST /reportes/:id/acpm`: returns 201 + the new ACPM.
pub async fn escalate<S: ReportStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewAcpm>,
) -> Result<(StatusCode, Json<Acpm>), ApiError> {
  let (_report, acpm) = store
    .escalate_report(id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(report_id = %id, acpm_id = %acpm.acpm_id, "report escalated");
  Ok((StatusCode::CREATED, Json(acpm)))
}
