//! Stored certificate templates and the log of generated certificates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::template::{FilledValues, TemplateSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateTemplate {
  pub template_id: Uuid,
  pub name:        String,
  /// Always stored in normalized (object) form.
  pub schema:      TemplateSchema,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Body of template create and update requests. The schema is accepted in
/// either stored shape and normalized by [`TemplateSchema::from_value`].
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
  pub name:   String,
  pub schema: serde_json::Value,
}

/// One rendered certificate, kept so it can be found again by batch or
/// client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCertificate {
  pub certificate_id: Uuid,
  pub template_id:    Uuid,
  pub template_name:  String,
  pub values:         FilledValues,
  /// Lot / batch number the certificate covers.
  pub batch:          Option<String>,
  pub client:         Option<String>,
  /// The rendered PDF in the drive.
  pub file_id:        Uuid,
  pub pdf_url:        String,
  pub page_count:     u32,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CertificateStore::record_generated`].
#[derive(Debug, Clone)]
pub struct NewGeneratedCertificate {
  pub template_id:   Uuid,
  pub template_name: String,
  pub values:        FilledValues,
  pub batch:         Option<String>,
  pub client:        Option<String>,
  pub file_id:       Uuid,
  pub pdf_url:       String,
  pub page_count:    u32,
}

/// Filters for [`crate::store::CertificateStore::search_generated`].
#[derive(Debug, Clone, Default)]
pub struct CertificateQuery {
  pub template_id: Option<Uuid>,
  /// Case-insensitive substring match against batch or client.
  pub text:        Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}
