//! JSON/multipart REST API for SGC.
//!
//! Exposes an axum [`Router`] backed by any [`QualityStore`] and any
//! [`CertificateRenderer`]. Auth, TLS, and body limits are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(sgc_api::api_router(store.clone(), renderer.clone()))
//! ```

pub mod acpm;
pub mod cards;
pub mod certificates;
pub mod drive;
pub mod error;
pub mod reports;
mod upload;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, post, put},
};
use sgc_certificate::CertificateRenderer;
use sgc_core::store::QualityStore;

pub use error::ApiError;

/// Shared handler state: the store plus the certificate renderer.
pub struct ApiState<S, R> {
  pub store:    Arc<S>,
  pub renderer: Arc<R>,
}

impl<S, R> Clone for ApiState<S, R> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), renderer: self.renderer.clone() }
  }
}

/// Handlers that only touch the store extract `State<Arc<S>>` directly.
impl<S, R> FromRef<ApiState<S, R>> for Arc<S> {
  fn from_ref(state: &ApiState<S, R>) -> Self { state.store.clone() }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type.
pub fn api_router<S, R>(store: Arc<S>, renderer: Arc<R>) -> Router<()>
where
  S: QualityStore + 'static,
  R: CertificateRenderer,
{
  Router::new()
    // Drive
    .route("/drive/contenido", get(drive::list_root::<S>))
    .route("/drive/contenido/{id}", get(drive::list_folder::<S>))
    .route("/drive/carpeta", post(drive::create_folder::<S>))
    .route(
      "/drive/carpeta/buscar-o-crear",
      post(drive::find_or_create_folder::<S>),
    )
    .route(
      "/drive/carpeta/{id}",
      put(drive::rename_folder::<S>).delete(drive::delete_folder::<S>),
    )
    .route("/drive/carpeta/{id}/ruta", get(drive::folder_path::<S>))
    .route("/drive/archivo", post(drive::upload::<S>))
    .route(
      "/drive/archivo/{id}",
      get(drive::download::<S>).delete(drive::delete_file::<S>),
    )
    // ACPM
    .route("/acpm", get(acpm::list::<S>).post(acpm::create::<S>))
    .route("/acpm/{id}", get(acpm::get_one::<S>).put(acpm::update::<S>))
    .route("/acpm/{id}/estado", put(acpm::transition::<S>))
    .route("/acpm/{id}/evidencia", post(acpm::upload_evidence::<S>))
    // Reports
    .route("/reportes", get(reports::list::<S>).post(reports::create::<S>))
    .route(
      "/reportes/{id}",
      get(reports::get_one::<S>).delete(reports::delete::<S>),
    )
    .route("/reportes/{id}/verificar", post(reports::verify::<S>))
    .route("/reportes/{id}/acpm", post(reports::escalate::<S>))
    // Certificates
    .route(
      "/certificados/plantillas",
      get(certificates::list_templates::<S>)
        .post(certificates::create_template::<S>),
    )
    .route(
      "/certificados/plantillas/{id}",
      get(certificates::get_template::<S>)
        .put(certificates::update_template::<S>)
        .delete(certificates::delete_template::<S>),
    )
    .route(
      "/certificados/plantillas/{id}/vista-previa",
      post(certificates::preview::<S, R>),
    )
    .route("/certificados/generar", post(certificates::generate::<S, R>))
    .route("/certificados/generados", get(certificates::search::<S>))
    .route("/certificados/generados/{id}", get(certificates::get_generated::<S>))
    // Documentation cards
    .route(
      "/core/tarjetas/{modulo}",
      get(cards::list::<S>).post(cards::create::<S>),
    )
    .route("/core/tarjetas/{modulo}/{id}", axum::routing::delete(cards::delete::<S>))
    .with_state(ApiState { store, renderer })
}

#[cfg(test)]
mod tests;
