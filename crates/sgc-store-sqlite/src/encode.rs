//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, UUIDs
//! hyphenated lowercase strings. Structured values (checklists, schemas,
//! filled values) are compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use sgc_core::{
  acpm::{Acpm, AcpmKind, AcpmSource, AcpmStatus, SourceKind},
  card::DocumentCard,
  certificate::{CertificateTemplate, GeneratedCertificate},
  drive::{DriveFile, Folder, file_url},
  report::Report,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// SHA-256 hex digest of a file's content.
pub fn content_hash(bytes: &[u8]) -> String {
  use sha2::{Digest, Sha256};
  hex::encode(Sha256::digest(bytes))
}

// ─── ACPM enums ──────────────────────────────────────────────────────────────

pub fn encode_acpm_kind(k: AcpmKind) -> &'static str {
  match k {
    AcpmKind::Corrective => "corrective",
    AcpmKind::Preventive => "preventive",
    AcpmKind::Improvement => "improvement",
  }
}

pub fn decode_acpm_kind(s: &str) -> Result<AcpmKind> {
  match s {
    "corrective" => Ok(AcpmKind::Corrective),
    "preventive" => Ok(AcpmKind::Preventive),
    "improvement" => Ok(AcpmKind::Improvement),
    other => Err(Error::Decode { column: "kind", value: other.to_owned() }),
  }
}

pub fn encode_status(s: AcpmStatus) -> &'static str {
  match s {
    AcpmStatus::Open => "open",
    AcpmStatus::InProgress => "in_progress",
    AcpmStatus::Closed => "closed",
  }
}

pub fn decode_status(s: &str) -> Result<AcpmStatus> {
  match s {
    "open" => Ok(AcpmStatus::Open),
    "in_progress" => Ok(AcpmStatus::InProgress),
    "closed" => Ok(AcpmStatus::Closed),
    other => Err(Error::Decode { column: "status", value: other.to_owned() }),
  }
}

pub fn encode_source_kind(k: SourceKind) -> &'static str {
  match k {
    SourceKind::Report => "report",
    SourceKind::Audit => "audit",
    SourceKind::Other => "other",
  }
}

pub fn decode_source_kind(s: &str) -> Result<SourceKind> {
  match s {
    "report" => Ok(SourceKind::Report),
    "audit" => Ok(SourceKind::Audit),
    "other" => Ok(SourceKind::Other),
    other => {
      Err(Error::Decode { column: "source_kind", value: other.to_owned() })
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const FOLDER_COLUMNS: &str =
  "folder_id, name, parent_id, created_at, created_by";

/// Raw strings read directly from a `folders` row.
pub struct RawFolder {
  pub folder_id:  String,
  pub name:       String,
  pub parent_id:  Option<String>,
  pub created_at: String,
  pub created_by: Option<String>,
}

impl RawFolder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      folder_id:  row.get(0)?,
      name:       row.get(1)?,
      parent_id:  row.get(2)?,
      created_at: row.get(3)?,
      created_by: row.get(4)?,
    })
  }

  pub fn into_folder(self) -> Result<Folder> {
    Ok(Folder {
      folder_id:  decode_uuid(&self.folder_id)?,
      name:       self.name,
      parent_id:  decode_opt_uuid(self.parent_id)?,
      created_at: decode_dt(&self.created_at)?,
      created_by: self.created_by,
    })
  }
}

pub const FILE_COLUMNS: &str =
  "file_id, folder_id, name, mime_type, size, content_hash, created_at";

/// Raw strings read directly from a `files` row.
pub struct RawFile {
  pub file_id:      String,
  pub folder_id:    String,
  pub name:         String,
  pub mime_type:    String,
  pub size:         i64,
  pub content_hash: String,
  pub created_at:   String,
}

impl RawFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:      row.get(0)?,
      folder_id:    row.get(1)?,
      name:         row.get(2)?,
      mime_type:    row.get(3)?,
      size:         row.get(4)?,
      content_hash: row.get(5)?,
      created_at:   row.get(6)?,
    })
  }

  pub fn into_file(self) -> Result<DriveFile> {
    let file_id = decode_uuid(&self.file_id)?;
    Ok(DriveFile {
      file_id,
      folder_id: decode_uuid(&self.folder_id)?,
      name: self.name,
      mime_type: self.mime_type,
      size: u64::try_from(self.size).map_err(|_| Error::Decode {
        column: "size",
        value:  self.size.to_string(),
      })?,
      content_hash: self.content_hash,
      url: file_url(file_id),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const ACPM_COLUMNS: &str = "acpm_id, kind, origin, source_kind, source_ref, \
  description, action_plan, responsible, due_date, root_cause, status, \
  closure_comment, evidence_url, created_at, updated_at, closed_at";

/// Raw strings read directly from an `acpms` row.
pub struct RawAcpm {
  pub acpm_id:         String,
  pub kind:            String,
  pub origin:          String,
  pub source_kind:     Option<String>,
  pub source_ref:      Option<String>,
  pub description:     String,
  pub action_plan:     String,
  pub responsible:     String,
  pub due_date:        String,
  pub root_cause:      Option<String>,
  pub status:          String,
  pub closure_comment: Option<String>,
  pub evidence_url:    Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub closed_at:       Option<String>,
}

impl RawAcpm {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      acpm_id:         row.get(0)?,
      kind:            row.get(1)?,
      origin:          row.get(2)?,
      source_kind:     row.get(3)?,
      source_ref:      row.get(4)?,
      description:     row.get(5)?,
      action_plan:     row.get(6)?,
      responsible:     row.get(7)?,
      due_date:        row.get(8)?,
      root_cause:      row.get(9)?,
      status:          row.get(10)?,
      closure_comment: row.get(11)?,
      evidence_url:    row.get(12)?,
      created_at:      row.get(13)?,
      updated_at:      row.get(14)?,
      closed_at:       row.get(15)?,
    })
  }

  pub fn into_acpm(self) -> Result<Acpm> {
    let source = match self.source_kind.as_deref() {
      Some(kind) => Some(AcpmSource {
        kind:         decode_source_kind(kind)?,
        reference_id: decode_opt_uuid(self.source_ref)?,
      }),
      None => None,
    };

    Ok(Acpm {
      acpm_id: decode_uuid(&self.acpm_id)?,
      kind: decode_acpm_kind(&self.kind)?,
      origin: self.origin,
      source,
      description: self.description,
      action_plan: self.action_plan,
      responsible: self.responsible,
      due_date: decode_date(&self.due_date)?,
      root_cause: self.root_cause,
      status: decode_status(&self.status)?,
      closure_comment: self.closure_comment,
      evidence_url: self.evidence_url,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      closed_at: self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const REPORT_COLUMNS: &str = "report_id, category, title, answers, passed, \
  evidence_url, verified, acpm_id, created_by, created_at";

/// Raw values read directly from a `reports` row.
pub struct RawReport {
  pub report_id:    String,
  pub category:     String,
  pub title:        String,
  pub answers:      String,
  pub passed:       bool,
  pub evidence_url: Option<String>,
  pub verified:     bool,
  pub acpm_id:      Option<String>,
  pub created_by:   Option<String>,
  pub created_at:   String,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:    row.get(0)?,
      category:     row.get(1)?,
      title:        row.get(2)?,
      answers:      row.get(3)?,
      passed:       row.get(4)?,
      evidence_url: row.get(5)?,
      verified:     row.get(6)?,
      acpm_id:      row.get(7)?,
      created_by:   row.get(8)?,
      created_at:   row.get(9)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      report_id:    decode_uuid(&self.report_id)?,
      category:     self.category,
      title:        self.title,
      answers:      serde_json::from_str(&self.answers)?,
      passed:       self.passed,
      evidence_url: self.evidence_url,
      verified:     self.verified,
      acpm_id:      decode_opt_uuid(self.acpm_id)?,
      created_by:   self.created_by,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const TEMPLATE_COLUMNS: &str =
  "template_id, name, schema_json, created_at, updated_at";

pub struct RawTemplate {
  pub template_id: String,
  pub name:        String,
  pub schema_json: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawTemplate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      template_id: row.get(0)?,
      name:        row.get(1)?,
      schema_json: row.get(2)?,
      created_at:  row.get(3)?,
      updated_at:  row.get(4)?,
    })
  }

  pub fn into_template(self) -> Result<CertificateTemplate> {
    Ok(CertificateTemplate {
      template_id: decode_uuid(&self.template_id)?,
      name:        self.name,
      schema:      serde_json::from_str(&self.schema_json)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const GENERATED_COLUMNS: &str = "certificate_id, template_id, \
  template_name, values_json, batch, client, file_id, pdf_url, page_count, \
  created_at";

pub struct RawGenerated {
  pub certificate_id: String,
  pub template_id:    String,
  pub template_name:  String,
  pub values_json:    String,
  pub batch:          Option<String>,
  pub client:         Option<String>,
  pub file_id:        String,
  pub pdf_url:        String,
  pub page_count:     u32,
  pub created_at:     String,
}

impl RawGenerated {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      certificate_id: row.get(0)?,
      template_id:    row.get(1)?,
      template_name:  row.get(2)?,
      values_json:    row.get(3)?,
      batch:          row.get(4)?,
      client:         row.get(5)?,
      file_id:        row.get(6)?,
      pdf_url:        row.get(7)?,
      page_count:     row.get(8)?,
      created_at:     row.get(9)?,
    })
  }

  pub fn into_generated(self) -> Result<GeneratedCertificate> {
    Ok(GeneratedCertificate {
      certificate_id: decode_uuid(&self.certificate_id)?,
      template_id:    decode_uuid(&self.template_id)?,
      template_name:  self.template_name,
      values:         serde_json::from_str(&self.values_json)?,
      batch:          self.batch,
      client:         self.client,
      file_id:        decode_uuid(&self.file_id)?,
      pdf_url:        self.pdf_url,
      page_count:     self.page_count,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const CARD_COLUMNS: &str =
  "card_id, module, title, description, folder_name, position, created_at";

pub struct RawCard {
  pub card_id:     String,
  pub module:      String,
  pub title:       String,
  pub description: Option<String>,
  pub folder_name: String,
  pub position:    i64,
  pub created_at:  String,
}

impl RawCard {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      card_id:     row.get(0)?,
      module:      row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      folder_name: row.get(4)?,
      position:    row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_card(self) -> Result<DocumentCard> {
    Ok(DocumentCard {
      card_id:     decode_uuid(&self.card_id)?,
      module:      self.module,
      title:       self.title,
      description: self.description,
      folder_name: self.folder_name,
      position:    self.position,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_round_trip_format() {
    let d = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
    assert_eq!(encode_date(d), "2026-01-09");
    assert_eq!(decode_date("2026-01-09").unwrap(), d);
    assert!(decode_date("09/01/2026").is_err());
  }

  #[test]
  fn unknown_status_is_a_decode_error() {
    assert!(matches!(
      decode_status("cerrada"),
      Err(Error::Decode { column: "status", .. })
    ));
  }

  #[test]
  fn content_hash_is_sha256_hex() {
    assert_eq!(
      content_hash(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }
}
