//! Shared API-key authentication.
//!
//! Clients send the key as `X-API-Key: <key>` or `Authorization: Bearer
//! <key>`. Only its argon2 PHC string is kept in the configuration.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use rand_core::OsRng;

use crate::error::Error;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AuthConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub api_key_hash: String,
}

/// The presented key, from `X-API-Key` first and then a bearer token.
pub fn presented_key(headers: &HeaderMap) -> Option<String> {
  let from_header = headers
    .get(API_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim);
  let from_bearer = || {
    headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
  };
  from_header
    .or_else(from_bearer)
    .filter(|k| !k.is_empty())
    .map(str::to_owned)
}

pub fn verify_key(key: &str, config: &AuthConfig) -> Result<(), Error> {
  let parsed_hash =
    PasswordHash::new(&config.api_key_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(key.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Argon2 PHC string for a new key, as printed by `sgc-server --hash-key`.
pub fn hash_key(key: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(key.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Middleware guarding every API route.
pub async fn require_api_key(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  let Some(key) = presented_key(req.headers()) else {
    tracing::warn!(path = %req.uri().path(), "request without api key");
    return Err(Error::Unauthorized);
  };

  // Argon2 verification is CPU-bound.
  tokio::task::spawn_blocking(move || verify_key(&key, &config))
    .await
    .map_err(|e| Error::Hash(e.to_string()))?
    .inspect_err(|_| {
      tracing::warn!(path = %req.uri().path(), "request with wrong api key");
    })?;

  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, Request};

  use super::*;

  fn config(key: &str) -> AuthConfig {
    AuthConfig { api_key_hash: hash_key(key).unwrap() }
  }

  fn headers(name: &str, value: &str) -> HeaderMap {
    let req = Request::builder()
      .header(name, HeaderValue::from_str(value).unwrap())
      .body(())
      .unwrap();
    req.headers().clone()
  }

  #[test]
  fn key_from_either_header() {
    assert_eq!(presented_key(&headers("X-API-Key", " abc ")).as_deref(), Some("abc"));
    assert_eq!(
      presented_key(&headers("Authorization", "Bearer abc")).as_deref(),
      Some("abc")
    );
    assert_eq!(presented_key(&headers("Authorization", "Basic abc")), None);
    assert_eq!(presented_key(&headers("X-API-Key", "  ")), None);
    assert_eq!(presented_key(&HeaderMap::new()), None);
  }

  #[test]
  fn correct_key() {
    assert!(verify_key("secret", &config("secret")).is_ok());
  }

  #[test]
  fn wrong_key() {
    assert!(matches!(
      verify_key("wrong", &config("secret")),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn malformed_hash_rejects() {
    let config = AuthConfig { api_key_hash: "not-a-phc-string".into() };
    assert!(matches!(verify_key("secret", &config), Err(Error::Unauthorized)));
  }
}
