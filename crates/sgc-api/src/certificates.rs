//! Handlers for `/certificados` endpoints: template administration, preview,
//! generation and the generated-certificate log.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/certificados/plantillas` | Ordered by name |
//! | `POST`   | `/certificados/plantillas` | Body: [`TemplateInput`]; legacy or current schema; 201 |
//! | `GET`    | `/certificados/plantillas/:id` | Schema in normalized form |
//! | `PUT`    | `/certificados/plantillas/:id` | Body: [`TemplateInput`] |
//! | `DELETE` | `/certificados/plantillas/:id` | Generated certificates are kept; 204 |
//! | `POST`   | `/certificados/plantillas/:id/vista-previa` | Body: [`FilledValues`]; `application/pdf`, nothing stored |
//! | `POST`   | `/certificados/generar` | Body: [`GenerateBody`]; 201 + log entry |
//! | `GET`    | `/certificados/generados` | `template_id`, `q`, `limit`, `offset` |
//! | `GET`    | `/certificados/generados/:id` | |

use std::sync::Arc;

use axum::{
  Json,
  body::Body,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use sgc_certificate::{CertificateRenderer, RenderedPdf};
use sgc_core::{
  certificate::{
    CertificateQuery, CertificateTemplate, GeneratedCertificate,
    NewGeneratedCertificate, TemplateInput,
  },
  drive::{NewFile, ensure_path},
  store::{CertificateStore, DriveStore},
  template::{FilledValues, ResolvedTemplate, TemplateSchema},
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  upload::{content_disposition, drive_safe},
};

/// Top-level drive folder for generated PDFs, one subfolder per template.
pub const CERTIFICATES_FOLDER: &str = "Certificados";

const PDF_MIME: &str = "application/pdf";

async fn require_template<S: CertificateStore>(
  store: &S,
  id: Uuid,
) -> Result<CertificateTemplate, ApiError> {
  store
    .get_template(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("certificate template {id} not found")))
}

/// Rendering is CPU-bound, so it runs on the blocking pool.
async fn render<R: CertificateRenderer>(
  renderer: Arc<R>,
  doc: ResolvedTemplate,
) -> Result<RenderedPdf, ApiError> {
  tokio::task::spawn_blocking(move || renderer.render(&doc))
    .await
    .map_err(|e| ApiError::Render(e.to_string()))?
    .map_err(|e| ApiError::Render(e.to_string()))
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// `GET /certificados/plantillas`
pub async fn list_templates<S: CertificateStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CertificateTemplate>>, ApiError> {
  let templates = store.list_templates().await.map_err(ApiError::store)?;
  Ok(Json(templates))
}

/// `POST /certificados/plantillas`: returns 201 + the stored template.
pub async fn create_template<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<TemplateInput>,
) -> Result<impl IntoResponse, ApiError> {
  let schema = TemplateSchema::from_value(body.schema)?;
  let template = store
    .create_template(body.name, schema)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    template_id = %template.template_id,
    name = %template.name,
    "certificate template created"
  );
  Ok((StatusCode::CREATED, Json(template)))
}

/// `GET /certificados/plantillas/:id`
pub async fn get_template<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CertificateTemplate>, ApiError> {
  Ok(Json(require_template(store.as_ref(), id).await?))
}

/// `PUT /certificados/plantillas/:id`
pub async fn update_template<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TemplateInput>,
) -> Result<Json<CertificateTemplate>, ApiError> {
  let schema = TemplateSchema::from_value(body.schema)?;
  let template = store
    .update_template(id, body.name, schema)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(template_id = %id, "certificate template updated");
  Ok(Json(template))
}

/// `DELETE /certificados/plantillas/:id`
pub async fn delete_template<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_template(id).await.map_err(ApiError::store)?;
  tracing::info!(template_id = %id, "certificate template deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Preview ─────────────────────────────────────────────────────────────────

/// `POST /certificados/plantillas/:id/vista-previa`
pub async fn preview<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
  Json(values): Json<FilledValues>,
) -> Result<Response, ApiError>
where
  S: CertificateStore,
  R: CertificateRenderer,
{
  let template = require_template(state.store.as_ref(), id).await?;
  let doc = template.schema.resolve(&template.name, &values)?;
  let pdf = render(state.renderer.clone(), doc).await?;

  let disposition =
    content_disposition("inline", &format!("{}.pdf", drive_safe(&template.name)));
  Ok(
    (
      [
        (header::CONTENT_TYPE, PDF_MIME.to_owned()),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      Body::from(pdf.bytes),
    )
      .into_response(),
  )
}

// ─── Generate ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub template_id: Uuid,
  #[serde(default)]
  pub values:      FilledValues,
  #[serde(default)]
  pub batch:       Option<String>,
  #[serde(default)]
  pub client:      Option<String>,
}

/// `POST /certificados/generar`: renders, stores the PDF under
/// `Certificados/<template name>` and records the log entry.
pub async fn generate<S, R>(
  State(state): State<ApiState<S, R>>,
  Json(body): Json<GenerateBody>,
) -> Result<(StatusCode, Json<GeneratedCertificate>), ApiError>
where
  S: CertificateStore + DriveStore,
  R: CertificateRenderer,
{
  let store = state.store.as_ref();
  let template = require_template(store, body.template_id).await?;
  let doc = template.schema.resolve(&template.name, &body.values)?;
  let pdf = render(state.renderer.clone(), doc).await?;

  let folder_name = drive_safe(&template.name);
  let folder = ensure_path(store, None, [CERTIFICATES_FOLDER, folder_name.as_str()])
    .await
    .map_err(ApiError::store)?;

  let stamp = Utc::now().format("%Y%m%d-%H%M%S");
  let file_name = match body.batch.as_deref().map(str::trim) {
    Some(batch) if !batch.is_empty() => {
      format!("{folder_name} {} {stamp}.pdf", drive_safe(batch))
    }
    _ => format!("{folder_name} {stamp}.pdf"),
  };
  let file = store
    .upload_file(NewFile {
      folder_id: folder.folder_id,
      name:      file_name,
      mime_type: PDF_MIME.to_owned(),
      content:   pdf.bytes,
    })
    .await
    .map_err(ApiError::store)?;

  let generated = store
    .record_generated(NewGeneratedCertificate {
      template_id:   template.template_id,
      template_name: template.name,
      values:        body.values,
      batch:         body.batch,
      client:        body.client,
      file_id:       file.file_id,
      pdf_url:       file.url,
      page_count:    pdf.page_count,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    certificate_id = %generated.certificate_id,
    template_id = %generated.template_id,
    pages = generated.page_count,
    "certificate generated"
  );

  Ok((StatusCode::CREATED, Json(generated)))
}

// ─── Generated log ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub template_id: Option<Uuid>,
  /// Free text matched against batch, client and template name.
  pub q:           Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// `GET /certificados/generados`
pub async fn search<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GeneratedCertificate>>, ApiError> {
  let query = CertificateQuery {
    template_id: params.template_id,
    text:        params.q,
    limit:       params.limit,
    offset:      params.offset,
  };
  let found = store.search_generated(&query).await.map_err(ApiError::store)?;
  Ok(Json(found))
}

/// `GET /certificados/generados/:id`
pub async fn get_generated<S: CertificateStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<GeneratedCertificate>, ApiError> {
  let generated = store
    .get_generated(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("generated certificate {id} not found")))?;
  Ok(Json(generated))
}
