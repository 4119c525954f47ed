use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use sgc_certificate::{CertificateRenderer, RenderedPdf, layout::layout};
use sgc_core::template::ResolvedTemplate;
use sgc_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::api_router;

/// Lays the document out for a real page count but skips font loading.
struct StubRenderer;

impl CertificateRenderer for StubRenderer {
  fn render(&self, doc: &ResolvedTemplate) -> sgc_certificate::Result<RenderedPdf> {
    Ok(RenderedPdf {
      bytes:      b"%PDF-stub".to_vec(),
      page_count: layout(doc).page_count(),
    })
  }
}

async fn make_router() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store), Arc::new(StubRenderer))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

const BOUNDARY: &str = "sgc-test-boundary";

/// A multipart body with text fields followed by one `file` part.
fn multipart(fields: &[(&str, &str)], file_name: &str, content: &[u8]) -> Body {
  let mut out = Vec::new();
  for (name, value) in fields {
    out.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
      )
      .as_bytes(),
    );
  }
  out.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
       filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
    )
    .as_bytes(),
  );
  out.extend_from_slice(content);
  out.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
  Body::from(out)
}

async fn send_multipart(app: &Router, uri: &str, body: Body) -> Response {
  let req = Request::builder()
    .method("POST")
    .uri(uri)
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={BOUNDARY}"),
    )
    .body(body)
    .unwrap();
  app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(resp: Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
}

// ── Drive ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_folder_then_list_root() {
  let app = make_router().await;

  let resp = send(&app, "POST", "/drive/carpeta", Some(json!({ "name": " Calidad " }))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let folder = body_json(resp).await;
  assert_eq!(folder["name"], "Calidad");

  let resp = send(&app, "GET", "/drive/contenido", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let contents = body_json(resp).await;
  assert_eq!(contents["folders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_sibling_returns_409() {
  let app = make_router().await;
  let body = json!({ "name": "Calidad" });

  let first = send(&app, "POST", "/drive/carpeta", Some(body.clone())).await;
  assert_eq!(first.status(), StatusCode::CREATED);
  let second = send(&app, "POST", "/drive/carpeta", Some(body.clone())).await;
  assert_eq!(second.status(), StatusCode::CONFLICT);

  // Find-or-create returns the existing folder instead.
  let found = send(&app, "POST", "/drive/carpeta/buscar-o-crear", Some(body)).await;
  assert_eq!(found.status(), StatusCode::OK);
  assert_eq!(body_json(found).await["folder_id"], body_json(first).await["folder_id"]);
}

#[tokio::test]
async fn blank_folder_name_returns_400() {
  let app = make_router().await;
  let resp = send(&app, "POST", "/drive/carpeta", Some(json!({ "name": "  " }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_download_with_etag() {
  let app = make_router().await;
  let folder = body_json(
    send(&app, "POST", "/drive/carpeta", Some(json!({ "name": "Docs" }))).await,
  )
  .await;
  let folder_id = folder["folder_id"].as_str().unwrap().to_owned();

  let resp = send_multipart(
    &app,
    "/drive/archivo",
    multipart(&[("folder_id", &folder_id)], "nota.txt", b"hola"),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let file = body_json(resp).await;
  assert_eq!(file["size"], 4);
  let url = file["url"].as_str().unwrap().to_owned();

  let resp = send(&app, "GET", &url, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let etag = resp.headers()[header::ETAG].to_str().unwrap().to_owned();
  let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
  assert!(disposition.contains("nota.txt"), "Content-Disposition: {disposition}");
  assert_eq!(body_bytes(resp).await, b"hola");

  let req = Request::builder()
    .uri(&url)
    .header(header::IF_NONE_MATCH, &etag)
    .body(Body::empty())
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

  let resp = send(&app, "DELETE", &url, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let resp = send(&app, "GET", &url, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_folder_id_returns_400() {
  let app = make_router().await;
  let resp = send_multipart(&app, "/drive/archivo", multipart(&[], "a.txt", b"x")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── ACPM ─────────────────────────────────────────────────────────────────────

fn new_acpm() -> Value {
  json!({
    "kind": "corrective",
    "origin": "Auditoría interna",
    "description": "Temperatura fuera de rango en cámara 2",
    "responsible": "Ana",
    "due_date": "2030-01-31"
  })
}

#[tokio::test]
async fn closing_without_evidence_returns_422() {
  let app = make_router().await;
  let acpm = body_json(send(&app, "POST", "/acpm", Some(new_acpm())).await).await;
  let id = acpm["acpm_id"].as_str().unwrap();

  let resp = send(
    &app,
    "PUT",
    &format!("/acpm/{id}/estado"),
    Some(json!({ "status": "closed" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

  let stored = body_json(send(&app, "GET", &format!("/acpm/{id}"), None).await).await;
  assert_eq!(stored["status"], "open");
}

#[tokio::test]
async fn evidence_upload_then_close() {
  let app = make_router().await;
  let acpm = body_json(send(&app, "POST", "/acpm", Some(new_acpm())).await).await;
  let id = acpm["acpm_id"].as_str().unwrap().to_owned();

  let resp = send_multipart(
    &app,
    &format!("/acpm/{id}/evidencia"),
    multipart(&[], "registro.txt", b"ok"),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let evidence = body_json(resp).await;
  let url = evidence["url"].as_str().unwrap().to_owned();

  let resp = send(
    &app,
    "PUT",
    &format!("/acpm/{id}/estado"),
    Some(json!({ "status": "closed", "evidence_url": url })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let closed = body_json(resp).await;
  assert_eq!(closed["status"], "closed");
  assert!(closed["closed_at"].is_string());

  // A closed ACPM takes no more evidence.
  let resp = send_multipart(
    &app,
    &format!("/acpm/{id}/evidencia"),
    multipart(&[], "tarde.txt", b"x"),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn evidence_name_with_separators_is_stored() {
  let app = make_router().await;
  let acpm = body_json(send(&app, "POST", "/acpm", Some(new_acpm())).await).await;
  let id = acpm["acpm_id"].as_str().unwrap().to_owned();

  let resp = send_multipart(
    &app,
    &format!("/acpm/{id}/evidencia"),
    multipart(&[], "fotos/camara2.jpg", b"jpg"),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let evidence = body_json(resp).await;
  assert_eq!(evidence["file"]["name"], "fotos-camara2.jpg");
}

#[tokio::test]
async fn unknown_acpm_returns_404() {
  let app = make_router().await;
  let resp = send(&app, "GET", &format!("/acpm/{}", uuid::Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Reports ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn escalating_twice_returns_409() {
  let app = make_router().await;
  let report = body_json(
    send(
      &app,
      "POST",
      "/reportes",
      Some(json!({
        "category": "bpm",
        "title": "Inspección diaria",
        "answers": [
          { "question": "Lavamanos con jabón", "answer": false },
          { "question": "Uniforme completo", "answer": true }
        ]
      })),
    )
    .await,
  )
  .await;
  assert_eq!(report["passed"], false);
  let id = report["report_id"].as_str().unwrap();

  let uri = format!("/reportes/{id}/acpm");
  let first = send(&app, "POST", &uri, Some(new_acpm())).await;
  assert_eq!(first.status(), StatusCode::CREATED);
  let second = send(&app, "POST", &uri, Some(new_acpm())).await;
  assert_eq!(second.status(), StatusCode::CONFLICT);

  let acpms = body_json(send(&app, "GET", &format!("/acpm?report_id={id}"), None).await).await;
  assert_eq!(acpms.as_array().unwrap().len(), 1);
}

// ── Certificates ─────────────────────────────────────────────────────────────

fn template_body() -> Value {
  json!({
    "name": "Certificado de análisis",
    "schema": {
      "header": [{ "label": "Código", "value": "FT-CC-01" }],
      "sections": [
        {
          "type": "info",
          "fields": [{ "key": "lote", "label": "Lote", "editable": true }]
        },
        {
          "type": "table",
          "key": "analisis",
          "columns": ["Parámetro", "Resultado"],
          "editable": true
        }
      ],
      "footer": [{ "label": "Elaboró" }]
    }
  })
}

#[tokio::test]
async fn invalid_template_schema_returns_400() {
  let app = make_router().await;
  let resp = send(
    &app,
    "POST",
    "/certificados/plantillas",
    Some(json!({ "name": "Roto", "schema": 42 })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_returns_pdf_without_storing() {
  let app = make_router().await;
  let template =
    body_json(send(&app, "POST", "/certificados/plantillas", Some(template_body())).await).await;
  let id = template["template_id"].as_str().unwrap();

  let resp = send(
    &app,
    "POST",
    &format!("/certificados/plantillas/{id}/vista-previa"),
    Some(json!({ "fields": { "lote": "L-1" } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
  assert!(body_bytes(resp).await.starts_with(b"%PDF"));

  let log = body_json(send(&app, "GET", "/certificados/generados", None).await).await;
  assert!(log.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn generate_stores_pdf_under_certificates_folder() {
  let app = make_router().await;
  let template =
    body_json(send(&app, "POST", "/certificados/plantillas", Some(template_body())).await).await;
  let template_id = template["template_id"].as_str().unwrap();

  let resp = send(
    &app,
    "POST",
    "/certificados/generar",
    Some(json!({
      "template_id": template_id,
      "values": {
        "fields": { "lote": "L-2024-07" },
        "tables": { "analisis": [["Humedad", "12 %"]] }
      },
      "batch": "L-2024-07",
      "client": "Panadería Sol"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let generated = body_json(resp).await;
  assert_eq!(generated["page_count"], 1);

  let pdf = send(&app, "GET", generated["pdf_url"].as_str().unwrap(), None).await;
  assert_eq!(pdf.status(), StatusCode::OK);
  assert_eq!(pdf.headers()[header::CONTENT_TYPE], "application/pdf");

  let root = body_json(send(&app, "GET", "/drive/contenido", None).await).await;
  let certs = &root["folders"][0];
  assert_eq!(certs["name"], "Certificados");
  let inner = body_json(
    send(
      &app,
      "GET",
      &format!("/drive/contenido/{}", certs["folder_id"].as_str().unwrap()),
      None,
    )
    .await,
  )
  .await;
  assert_eq!(inner["folders"][0]["name"], "Certificado de análisis");

  let found = body_json(
    send(&app, "GET", "/certificados/generados?q=panader", None).await,
  )
  .await;
  assert_eq!(found.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn table_row_with_wrong_width_returns_400() {
  let app = make_router().await;
  let template =
    body_json(send(&app, "POST", "/certificados/plantillas", Some(template_body())).await).await;

  let resp = send(
    &app,
    "POST",
    "/certificados/generar",
    Some(json!({
      "template_id": template["template_id"],
      "values": { "tables": { "analisis": [["solo una celda"]] } }
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Documentation cards ──────────────────────────────────────────────────────

#[tokio::test]
async fn cards_resolve_to_module_folders() {
  let app = make_router().await;

  let resp = send(
    &app,
    "POST",
    "/core/tarjetas/plagas",
    Some(json!({ "title": "Fichas técnicas" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let card = body_json(resp).await;

  let cards = body_json(send(&app, "GET", "/core/tarjetas/plagas", None).await).await;
  assert_eq!(cards[0]["folder_id"], card["folder_id"]);

  let path = body_json(
    send(
      &app,
      "GET",
      &format!("/drive/carpeta/{}/ruta", card["folder_id"].as_str().unwrap()),
      None,
    )
    .await,
  )
  .await;
  let names: Vec<_> = path
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["plagas", "Fichas técnicas"]);

  let resp = send(
    &app,
    "DELETE",
    &format!("/core/tarjetas/plagas/{}", card["card_id"].as_str().unwrap()),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
