//! Documentation cards: the entries of each module's "Documentación" tab.
//!
//! A card names a drive folder below the module's own top-level folder; the
//! folder is located (or created) on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCard {
  pub card_id:     Uuid,
  /// Module slug, e.g. `"plagas"`, `"calibracion"`.
  pub module:      String,
  pub title:       String,
  pub description: Option<String>,
  /// Name of the folder below the module folder that holds the documents.
  pub folder_name: String,
  pub position:    i64,
  pub created_at:  DateTime<Utc>,
}

/// A card together with the drive folder it currently maps to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCard {
  #[serde(flatten)]
  pub card:      DocumentCard,
  pub folder_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCard {
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  /// Defaults to the title.
  #[serde(default)]
  pub folder_name: Option<String>,
  #[serde(default)]
  pub position:    Option<i64>,
}

/// Lower-case a module name and keep only characters that are safe in a URL
/// path segment.
pub fn normalize_module(raw: &str) -> Result<String> {
  let slug: String = raw
    .trim()
    .to_lowercase()
    .chars()
    .map(|c| if c.is_whitespace() { '-' } else { c })
    .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
    .collect();
  if slug.is_empty() {
    return Err(Error::Validation(format!("invalid module name {raw:?}")));
  }
  Ok(slug)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn module_slug() {
    assert_eq!(normalize_module(" Control Plagas ").unwrap(), "control-plagas");
    assert_eq!(normalize_module("calibración").unwrap(), "calibración");
    assert!(normalize_module("//").is_err());
  }
}
