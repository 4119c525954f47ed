//! Multipart upload parsing and download response headers.

use std::collections::HashMap;

use axum::{
  body::Body,
  extract::Multipart,
  http::{HeaderValue, StatusCode, header},
  response::Response,
};
use sgc_core::drive::DriveFile;

use crate::error::ApiError;

/// The `file` part of a multipart upload.
pub struct UploadedFile {
  pub name:      String,
  pub mime_type: String,
  pub content:   Vec<u8>,
}

/// A parsed multipart body: text fields plus the optional `file` part.
#[derive(Default)]
pub struct Upload {
  pub fields: HashMap<String, String>,
  pub file:   Option<UploadedFile>,
}

impl Upload {
  pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await? {
      let Some(name) = field.name().map(str::to_owned) else {
        continue;
      };
      if name == "file" {
        let file_name = field
          .file_name()
          .map(str::to_owned)
          .unwrap_or_else(|| "archivo".to_owned());
        let mime_type = field.content_type().map(str::to_owned).unwrap_or_default();
        let content = field.bytes().await?.to_vec();
        upload.file = Some(UploadedFile { name: file_name, mime_type, content });
      } else {
        upload.fields.insert(name, field.text().await?);
      }
    }
    Ok(upload)
  }

  pub fn require_file(&mut self) -> Result<UploadedFile, ApiError> {
    self
      .file
      .take()
      .ok_or_else(|| ApiError::BadRequest("missing multipart part \"file\"".into()))
  }
}

/// Folder and file names may not contain path separators.
pub fn drive_safe(name: &str) -> String { name.trim().replace(['/', '\\'], "-") }

/// Serve stored bytes with their mime type, a download filename and the
/// content hash as a strong `ETag`.
pub fn file_response(
  file: &DriveFile,
  content: Vec<u8>,
  if_none_match: Option<&HeaderValue>,
  disposition: &str,
) -> Response {
  let etag = format!("\"{}\"", file.content_hash);
  let not_modified = if_none_match
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"));

  let mut builder = Response::builder().header(header::ETAG, &etag);
  let body = if not_modified {
    builder = builder.status(StatusCode::NOT_MODIFIED);
    Body::empty()
  } else {
    builder = builder
      .status(StatusCode::OK)
      .header(header::CONTENT_TYPE, &file.mime_type)
      .header(header::CONTENT_DISPOSITION, content_disposition(disposition, &file.name));
    Body::from(content)
  };

  builder.body(body).unwrap_or_else(|_| {
    // Only reachable with a mime type that is not a valid header value.
    let mut fallback = Response::new(Body::empty());
    *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    fallback
  })
}

/// `inline`/`attachment` with an ASCII fallback name and the RFC 5987 UTF-8
/// form.
pub fn content_disposition(kind: &str, name: &str) -> String {
  let ascii: String = name
    .chars()
    .map(|c| {
      if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' }
    })
    .collect();
  let mut encoded = String::with_capacity(name.len() * 3);
  for b in name.bytes() {
    if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
      encoded.push(b as char);
    } else {
      encoded.push_str(&format!("%{b:02X}"));
    }
  }
  format!("{kind}; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disposition_has_ascii_and_utf8_names() {
    assert_eq!(
      content_disposition("attachment", "Análisis \"v2\".pdf"),
      "attachment; filename=\"An_lisis _v2_.pdf\"; \
       filename*=UTF-8''An%C3%A1lisis%20%22v2%22.pdf"
    );
  }

  #[test]
  fn drive_safe_replaces_separators() {
    assert_eq!(drive_safe(" fotos/cámara\\2.jpg "), "fotos-cámara-2.jpg");
  }
}
