//! Store traits, one per area, plus the [`QualityStore`] umbrella.
//!
//! Implemented by storage backends (e.g. `sgc-store-sqlite`). The API layer
//! depends on these abstractions, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used from axum
//! handlers on a multi-threaded tokio runtime.

use std::future::Future;

use uuid::Uuid;

use crate::{
  acpm::{Acpm, AcpmQuery, AcpmTransition, AcpmUpdate, NewAcpm},
  card::{DocumentCard, NewCard},
  certificate::{
    CertificateQuery, CertificateTemplate, GeneratedCertificate,
    NewGeneratedCertificate,
  },
  drive::{DriveFile, Folder, FolderContents, NewFile, NewFolder},
  error::DomainError,
  report::{NewReport, Report},
  template::TemplateSchema,
};

// ─── Base ────────────────────────────────────────────────────────────────────

/// The error type shared by every store trait of one backend.
pub trait Store: Send + Sync {
  type Error: std::error::Error
    + DomainError
    + From<crate::Error>
    + Send
    + Sync
    + 'static;
}

// ─── Drive ───────────────────────────────────────────────────────────────────

pub trait DriveStore: Store {
  /// Children of `folder_id`, or of the top level when `None`.
  fn list_contents(
    &self,
    folder_id: Option<Uuid>,
  ) -> impl Future<Output = Result<FolderContents, Self::Error>> + Send + '_;

  fn get_folder(
    &self,
    folder_id: Uuid,
  ) -> impl Future<Output = Result<Option<Folder>, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::FolderExists`] if a sibling already has the
  /// name.
  fn create_folder(
    &self,
    input: NewFolder,
  ) -> impl Future<Output = Result<Folder, Self::Error>> + Send + '_;

  /// Return the sibling with this name, creating it if needed. Atomic:
  /// concurrent callers get the same folder.
  fn find_or_create_folder(
    &self,
    input: NewFolder,
  ) -> impl Future<Output = Result<Folder, Self::Error>> + Send + '_;

  fn rename_folder(
    &self,
    folder_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Folder, Self::Error>> + Send + '_;

  /// Delete a folder together with every descendant folder and file.
  fn delete_folder(
    &self,
    folder_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Ancestors of `folder_id` from the top level down, ending with the
  /// folder itself.
  fn folder_path(
    &self,
    folder_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Folder>, Self::Error>> + Send + '_;

  fn upload_file(
    &self,
    input: NewFile,
  ) -> impl Future<Output = Result<DriveFile, Self::Error>> + Send + '_;

  fn get_file(
    &self,
    file_id: Uuid,
  ) -> impl Future<Output = Result<Option<DriveFile>, Self::Error>> + Send + '_;

  /// Metadata and content. Returns `None` if the file does not exist.
  fn download_file(
    &self,
    file_id: Uuid,
  ) -> impl Future<Output = Result<Option<(DriveFile, Vec<u8>)>, Self::Error>>
  + Send
  + '_;

  fn delete_file(
    &self,
    file_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── ACPM ────────────────────────────────────────────────────────────────────

pub trait AcpmStore: Store {
  fn create_acpm(
    &self,
    input: NewAcpm,
  ) -> impl Future<Output = Result<Acpm, Self::Error>> + Send + '_;

  fn get_acpm(
    &self,
    acpm_id: Uuid,
  ) -> impl Future<Output = Result<Option<Acpm>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_acpms<'a>(
    &'a self,
    query: &'a AcpmQuery,
  ) -> impl Future<Output = Result<Vec<Acpm>, Self::Error>> + Send + 'a;

  fn update_acpm(
    &self,
    acpm_id: Uuid,
    update: AcpmUpdate,
  ) -> impl Future<Output = Result<Acpm, Self::Error>> + Send + '_;

  /// Move an ACPM to a new status, enforcing the lifecycle rules in
  /// [`crate::acpm::check_transition`]. Nothing is written when the
  /// transition is rejected.
  fn transition_acpm(
    &self,
    acpm_id: Uuid,
    transition: AcpmTransition,
  ) -> impl Future<Output = Result<Acpm, Self::Error>> + Send + '_;
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub trait ReportStore: Store {
  fn create_report(
    &self,
    input: NewReport,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  fn get_report(
    &self,
    report_id: Uuid,
  ) -> impl Future<Output = Result<Option<Report>, Self::Error>> + Send + '_;

  /// Newest first, optionally restricted to one category.
  fn list_reports(
    &self,
    category: Option<String>,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  fn verify_report(
    &self,
    report_id: Uuid,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  fn delete_report(
    &self,
    report_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Create an ACPM sourced from the report and link it back, in one
  /// transaction.
  fn escalate_report(
    &self,
    report_id: Uuid,
    input: NewAcpm,
  ) -> impl Future<Output = Result<(Report, Acpm), Self::Error>> + Send + '_;
}

// ─── Certificates ────────────────────────────────────────────────────────────

pub trait CertificateStore: Store {
  fn create_template(
    &self,
    name: String,
    schema: TemplateSchema,
  ) -> impl Future<Output = Result<CertificateTemplate, Self::Error>> + Send + '_;

  fn get_template(
    &self,
    template_id: Uuid,
  ) -> impl Future<Output = Result<Option<CertificateTemplate>, Self::Error>>
  + Send
  + '_;

  /// Ordered by name.
  fn list_templates(
    &self,
  ) -> impl Future<Output = Result<Vec<CertificateTemplate>, Self::Error>>
  + Send
  + '_;

  fn update_template(
    &self,
    template_id: Uuid,
    name: String,
    schema: TemplateSchema,
  ) -> impl Future<Output = Result<CertificateTemplate, Self::Error>> + Send + '_;

  /// Generated certificates keep their log entry and PDF.
  fn delete_template(
    &self,
    template_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_generated(
    &self,
    input: NewGeneratedCertificate,
  ) -> impl Future<Output = Result<GeneratedCertificate, Self::Error>> + Send + '_;

  fn get_generated(
    &self,
    certificate_id: Uuid,
  ) -> impl Future<Output = Result<Option<GeneratedCertificate>, Self::Error>>
  + Send
  + '_;

  /// Newest first.
  fn search_generated<'a>(
    &'a self,
    query: &'a CertificateQuery,
  ) -> impl Future<Output = Result<Vec<GeneratedCertificate>, Self::Error>>
  + Send
  + 'a;
}

// ─── Documentation cards ─────────────────────────────────────────────────────

pub trait CardStore: Store {
  /// Ordered by position, then title.
  fn list_cards(
    &self,
    module: String,
  ) -> impl Future<Output = Result<Vec<DocumentCard>, Self::Error>> + Send + '_;

  fn create_card(
    &self,
    module: String,
    input: NewCard,
  ) -> impl Future<Output = Result<DocumentCard, Self::Error>> + Send + '_;

  fn delete_card(
    &self,
    module: String,
    card_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the HTTP API needs from a backend.
pub trait QualityStore:
  DriveStore + AcpmStore + ReportStore + CertificateStore + CardStore
{
}

impl<T> QualityStore for T where
  T: DriveStore + AcpmStore + ReportStore + CertificateStore + CardStore
{
}
