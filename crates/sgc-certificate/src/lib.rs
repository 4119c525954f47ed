//! Certificate rendering: lays out a resolved template and writes it as PDF.
//!
//! [`layout::layout`] is pure and device-independent; [`PdfRenderer`] turns
//! its page model into PDF bytes with `genpdf`. Callers depend on the
//! [`CertificateRenderer`] trait so that tests can substitute a renderer
//! that needs no font files.

pub mod error;
pub mod layout;
pub mod metrics;
mod pdf;

pub use error::{Error, Result};
pub use pdf::{FALLBACK_FAMILY, PdfRenderer};
use sgc_core::template::ResolvedTemplate;

#[derive(Debug, Clone)]
pub struct RenderedPdf {
  pub bytes:      Vec<u8>,
  pub page_count: u32,
}

pub trait CertificateRenderer: Send + Sync + 'static {
  fn render(&self, doc: &ResolvedTemplate) -> Result<RenderedPdf>;
}
