//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use sgc_core::{DomainError, ErrorClass};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// A business rule rejected an otherwise valid request.
  #[error("{0}")]
  Rejected(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("render error: {0}")]
  Render(String),
}

impl ApiError {
  /// Classify a store error by the domain error behind it, if any.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    let Some(domain) = err.domain() else {
      return Self::Store(Box::new(err));
    };
    let message = domain.to_string();
    match domain.class() {
      ErrorClass::NotFound => Self::NotFound(message),
      ErrorClass::Conflict => Self::Conflict(message),
      ErrorClass::Rejected => {
        tracing::warn!(reason = %message, "request rejected");
        Self::Rejected(message)
      }
      ErrorClass::Invalid => Self::BadRequest(message),
      ErrorClass::Internal => Self::Store(Box::new(err)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      ApiError::Store(_) | ApiError::Render(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<sgc_core::Error> for ApiError {
  fn from(err: sgc_core::Error) -> Self { Self::store(err) }
}

impl From<MultipartError> for ApiError {
  fn from(err: MultipartError) -> Self {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(err.body_text())
    } else {
      ApiError::BadRequest(err.body_text())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m)
      | ApiError::BadRequest(m)
      | ApiError::Conflict(m)
      | ApiError::Rejected(m)
      | ApiError::PayloadTooLarge(m)
      | ApiError::Render(m) => m.clone(),
      ApiError::Store(e) => e.to_string(),
    };
    if status.is_server_error() {
      tracing::error!(error = %message, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_to_statuses() {
    let cases = [
      (sgc_core::Error::AcpmNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (sgc_core::Error::FolderExists("a".into()), StatusCode::CONFLICT),
      (sgc_core::Error::MissingEvidence, StatusCode::UNPROCESSABLE_ENTITY),
      (sgc_core::Error::Validation("x".into()), StatusCode::BAD_REQUEST),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }
}
