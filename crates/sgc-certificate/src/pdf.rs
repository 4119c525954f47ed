//! PDF output via `genpdf`'s low-level renderer.

use std::path::Path;

use genpdf::{
  PaperSize, Position,
  fonts::{self, FontCache, FontData, FontFamily},
  render::Renderer,
  style::Style,
};
use sgc_core::template::ResolvedTemplate;

use crate::{
  CertificateRenderer, RenderedPdf,
  error::{Error, Result},
  layout::{Layout, Op, layout},
};

/// Used when the configured family is missing from the fonts directory.
pub const FALLBACK_FAMILY: &str = "LiberationSans";

#[allow(dead_code)]
const RULE_THICKNESS: f64 = 0.3;

/// Renders certificates to PDF with a TTF family loaded from disk.
///
/// The family is looked up as `<dir>/<family>-Regular.ttf`, `-Bold.ttf`,
/// `-Italic.ttf` and `-BoldItalic.ttf`.
#[derive(Clone)]
pub struct PdfRenderer {
  family: FontFamily<FontData>,
}

impl PdfRenderer {
  pub fn from_dir(dir: impl AsRef<Path>, family: &str) -> Result<Self> {
    let dir = dir.as_ref();
    let loaded = fonts::from_files(dir, family, None).or_else(|e| {
      if family == FALLBACK_FAMILY {
        return Err(e);
      }
      tracing::warn!(
        family,
        fallback = FALLBACK_FAMILY,
        error = %e,
        "font family not found, trying fallback"
      );
      fonts::from_files(dir, FALLBACK_FAMILY, None)
    });

    match loaded {
      Ok(family) => Ok(Self { family }),
      Err(source) => Err(Error::Fonts {
        dir: dir.to_path_buf(),
        family: family.to_owned(),
        source,
      }),
    }
  }

  /// Draw a finished layout into PDF bytes.
  pub fn write(&self, title: &str, layout: &Layout) -> Result<Vec<u8>> {
    let mut renderer = Renderer::new(PaperSize::A4, title)?;
    for _ in 1..layout.pages.len() {
      renderer.add_page(PaperSize::A4);
    }

    let mut cache = FontCache::new(self.family.clone());
    cache.load_pdf_fonts(&renderer)?;

    for (i, page) in layout.pages.iter().enumerate() {
      let Some(pdf_page) = renderer.get_page(i) else {
        continue;
      };
      let layer = pdf_page.first_layer();
      let area = layer.area();

      for op in &page.ops {
        match op {
          Op::Text { x, y, size, bold, text } => {
            let mut style = Style::new().with_font_size(*size);
            if *bold {
              style = style.bold();
            }
            area.print_str(&cache, Position::new(*x, *y), style, text)?;
          }
          Op::Line { x1, y1, x2, y2 } => {
            area.draw_line(
              vec![Position::new(*x1, *y1), Position::new(*x2, *y2)],
              rule(),
            );
          }
          Op::Rect { x, y, w, h } => {
            area.draw_line(
              vec![
                Position::new(*x, *y),
                Position::new(x + w, *y),
                Position::new(x + w, y + h),
                Position::new(*x, y + h),
                Position::new(*x, *y),
              ],
              rule(),
            );
          }
        }
      }
    }

    let mut out = Vec::new();
    renderer.write(&mut out)?;
    Ok(out)
  }
}

// genpdf 0.2 has no line-thickness control; RULE_THICKNESS is not applied.
fn rule() -> Style { Style::new() }

impl CertificateRenderer for PdfRenderer {
  fn render(&self, doc: &ResolvedTemplate) -> Result<RenderedPdf> {
    let layout = layout(doc);
    let bytes = self.write(&doc.title, &layout)?;
    tracing::debug!(
      title = %doc.title,
      pages = layout.page_count(),
      bytes = bytes.len(),
      "rendered certificate"
    );
    Ok(RenderedPdf { bytes, page_count: layout.page_count() })
  }
}
