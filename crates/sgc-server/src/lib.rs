//! HTTP server assembly for SGC: configuration, API-key auth, request
//! tracing and body limits around the [`sgc_api`] router.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use serde::Deserialize;
use sgc_certificate::{CertificateRenderer, FALLBACK_FAMILY};
use sgc_core::store::QualityStore;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_api_key};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SGC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Argon2 PHC string of the shared API key.
  pub api_key_hash:     String,
  #[serde(default = "default_fonts_dir")]
  pub fonts_dir:        PathBuf,
  #[serde(default = "default_font_family")]
  pub font_family:      String,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/sgc/sgc.db") }
fn default_fonts_dir() -> PathBuf { PathBuf::from("fonts") }
fn default_font_family() -> String { FALLBACK_FAMILY.into() }
fn default_max_upload_bytes() -> usize { 25 * 1024 * 1024 }

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> &'static str { "ok" }

/// Build the full application: every API route behind the key check, plus an
/// unauthenticated `/health`.
pub fn router<S, R>(store: Arc<S>, renderer: Arc<R>, config: &ServerConfig) -> Router
where
  S: QualityStore + 'static,
  R: CertificateRenderer,
{
  let auth = Arc::new(AuthConfig { api_key_hash: config.api_key_hash.clone() });

  let api = sgc_api::api_router(store, renderer)
    .layer(middleware::from_fn_with_state(auth, require_api_key));

  Router::new()
    .route("/health", get(health))
    .merge(api)
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use sgc_certificate::RenderedPdf;
  use sgc_core::template::ResolvedTemplate;
  use sgc_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  struct NoopRenderer;

  impl CertificateRenderer for NoopRenderer {
    fn render(&self, _: &ResolvedTemplate) -> sgc_certificate::Result<RenderedPdf> {
      Ok(RenderedPdf { bytes: Vec::new(), page_count: 1 })
    }
  }

  async fn make_app(key: &str, max_upload_bytes: usize) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      host:             "127.0.0.1".into(),
      port:             8080,
      store_path:       PathBuf::from(":memory:"),
      api_key_hash:     auth::hash_key(key).unwrap(),
      fonts_dir:        PathBuf::from("fonts"),
      font_family:      FALLBACK_FAMILY.into(),
      max_upload_bytes,
    };
    router(Arc::new(store), Arc::new(NoopRenderer), &config)
  }

  async fn get_with(app: &Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().uri(uri);
    for (k, v) in headers {
      builder = builder.header(*k, *v);
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
  }

  #[tokio::test]
  async fn health_needs_no_key() {
    let app = make_app("secret", 1024).await;
    let resp = get_with(&app, "/health", &[]).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn missing_key_returns_401() {
    let app = make_app("secret", 1024).await;
    let resp = get_with(&app, "/drive/contenido", &[]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_key_returns_401() {
    let app = make_app("secret", 1024).await;
    let resp = get_with(&app, "/drive/contenido", &[("x-api-key", "nope")]).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn either_header_form_is_accepted() {
    let app = make_app("secret", 1024).await;
    let resp = get_with(&app, "/drive/contenido", &[("x-api-key", "secret")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp =
      get_with(&app, "/drive/contenido", &[("authorization", "Bearer secret")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn oversized_body_returns_413() {
    let app = make_app("secret", 64).await;
    let req = Request::builder()
      .method("POST")
      .uri("/drive/carpeta")
      .header("x-api-key", "secret")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(format!("{{\"name\":\"{}\"}}", "a".repeat(256))))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }
}
