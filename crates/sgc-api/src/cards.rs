//! Handlers for `/core/tarjetas` (documentation cards).
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/core/tarjetas/:modulo` | Cards with their drive folder, created on first read |
//! | `POST`   | `/core/tarjetas/:modulo` | Body: [`NewCard`]; 201 |
//! | `DELETE` | `/core/tarjetas/:modulo/:id` | The folder is kept; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use sgc_core::{
  card::{DocumentCard, NewCard, ResolvedCard},
  drive::ensure_path,
  store::{CardStore, DriveStore},
};
use uuid::Uuid;

use crate::error::ApiError;

async fn resolve<S: DriveStore>(
  store: &S,
  card: DocumentCard,
) -> Result<ResolvedCard, ApiError> {
  let folder = ensure_path(store, None, [card.module.as_str(), card.folder_name.as_str()])
    .await
    .map_err(ApiError::store)?;
  Ok(ResolvedCard { card, folder_id: folder.folder_id })
}

/// `GET /core/tarjetas/:modulo`
pub async fn list<S: CardStore + DriveStore>(
  State(store): State<Arc<S>>,
  Path(module): Path<String>,
) -> Result<Json<Vec<ResolvedCard>>, ApiError> {
  let cards = store.list_cards(module).await.map_err(ApiError::store)?;
  let mut resolved = Vec::with_capacity(cards.len());
  for card in cards {
    resolved.push(resolve(store.as_ref(), card).await?);
  }
  Ok(Json(resolved))
}

/// `POST /core/tarjetas/:modulo`
pub async fn create<S: CardStore + DriveStore>(
  State(store): State<Arc<S>>,
  Path(module): Path<String>,
  Json(body): Json<NewCard>,
) -> Result<(StatusCode, Json<ResolvedCard>), ApiError> {
  let card = store.create_card(module, body).await.map_err(ApiError::store)?;
  tracing::info!(
    card_id = %card.card_id,
    module = %card.module,
    folder = %card.folder_name,
    "documentation card created"
  );
  let resolved = resolve(store.as_ref(), card).await?;
  Ok((StatusCode::CREATED, Json(resolved)))
}

/// `DELETE /core/tarjetas/:modulo/:id`
pub async fn delete<S: CardStore>(
  State(store): State<Arc<S>>,
  Path((module, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
  store.delete_card(module, id).await.map_err(ApiError::store)?;
  tracing::info!(card_id = %id, "documentation card deleted");
  Ok(StatusCode::NO_CONTENT)
}
