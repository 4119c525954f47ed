//! Error types for `sgc-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::acpm::AcpmStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("folder not found: {0}")]
  FolderNotFound(Uuid),

  #[error("file not found: {0}")]
  FileNotFound(Uuid),

  #[error("acpm not found: {0}")]
  AcpmNotFound(Uuid),

  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("certificate template not found: {0}")]
  TemplateNotFound(Uuid),

  #[error("generated certificate not found: {0}")]
  CertificateNotFound(Uuid),

  #[error("documentation card not found: {0}")]
  CardNotFound(Uuid),

  #[error("a folder named {0:?} already exists here")]
  FolderExists(String),

  #[error("closing an acpm requires evidence (uploaded file or link)")]
  MissingEvidence,

  #[error("cannot move acpm from {from} to {to}")]
  InvalidTransition { from: AcpmStatus, to: AcpmStatus },

  #[error("acpm {0} is closed")]
  AcpmClosed(Uuid),

  #[error("report {report} is already linked to acpm {acpm}")]
  AlreadyEscalated { report: Uuid, acpm: Uuid },

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// How an error should be reported to a caller, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  NotFound,
  Conflict,
  /// The request was well-formed but a business rule rejected it.
  Rejected,
  Invalid,
  Internal,
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::FolderNotFound(_)
      | Self::FileNotFound(_)
      | Self::AcpmNotFound(_)
      | Self::ReportNotFound(_)
      | Self::TemplateNotFound(_)
      | Self::CertificateNotFound(_)
      | Self::CardNotFound(_) => ErrorClass::NotFound,
      Self::FolderExists(_) | Self::AlreadyEscalated { .. } => {
        ErrorClass::Conflict
      }
      Self::MissingEvidence
      | Self::InvalidTransition { .. }
      | Self::AcpmClosed(_) => ErrorClass::Rejected,
      Self::Validation(_) => ErrorClass::Invalid,
      Self::Serialization(_) => ErrorClass::Internal,
    }
  }
}

/// Implemented by backend error types so higher layers can recover the
/// domain error (if any) that caused a store failure.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
