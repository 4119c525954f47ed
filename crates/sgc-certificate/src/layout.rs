//! Page layout for resolved certificate templates.
//!
//! Produces a device-independent [`Layout`]: A4 portrait pages of text runs,
//! lines and rectangles in millimetres, origin at the top-left corner. Text
//! positions are the top of the line box.
//!
//! Every page carries the same header block (template title plus header
//! fields) above the body and a "Página i de N" footer below it. Body
//! sections flow top to bottom and break onto new pages as needed; tables
//! repeat their column header after a break. The signature block (one line
//! per footer field) closes the document on the last page.

use sgc_core::template::{ResolvedField, ResolvedSection, ResolvedTemplate};

use crate::metrics::{line_height, text_width, wrap};

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 15.0;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

/// Height reserved at the bottom of each page for the page number.
pub const FOOTER_BAND: f64 = 10.0;
/// Lowest y any body content may reach.
pub const BODY_BOTTOM: f64 = PAGE_HEIGHT - MARGIN - FOOTER_BAND;

const TITLE_SIZE: u8 = 14;
const HEADER_SIZE: u8 = 9;
const SECTION_TITLE_SIZE: u8 = 11;
const BODY_SIZE: u8 = 10;
const TABLE_SIZE: u8 = 9;
const SIGNATURE_SIZE: u8 = 9;
const PAGE_NUMBER_SIZE: u8 = 8;

const GRID_GAP: f64 = 6.0;
const SECTION_GAP: f64 = 5.0;
const CELL_PAD: f64 = 1.5;
const SIGNATURE_HEIGHT: f64 = 24.0;
const SIGNATURE_LINE_OFFSET: f64 = 14.0;
const SIGNATURES_PER_ROW: usize = 3;

/// Tallest header block repeated on every page. Taller header fields are
/// printed once in the body instead.
const MAX_HEADER_HEIGHT: f64 = 100.0;
const MAX_TITLE_LINES: usize = 3;

// ─── Page model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
  Text { x: f64, y: f64, size: u8, bold: bool, text: String },
  Line { x1: f64, y1: f64, x2: f64, y2: f64 },
  Rect { x: f64, y: f64, w: f64, h: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
  pub ops: Vec<Op>,
}

impl Page {
  /// The text runs on this page, in drawing order.
  pub fn texts(&self) -> impl Iterator<Item = &str> {
    self.ops.iter().filter_map(|op| match op {
      Op::Text { text, .. } => Some(text.as_str()),
      _ => None,
    })
  }

  fn text(&mut self, x: f64, y: f64, size: u8, bold: bool, text: impl Into<String>) {
    self.ops.push(Op::Text { x, y, size, bold, text: text.into() });
  }

  fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
    self.ops.push(Op::Line { x1, y1, x2, y2 });
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
  pub pages: Vec<Page>,
}

impl Layout {
  pub fn page_count(&self) -> u32 { self.pages.len() as u32 }
}

/// Lay out a resolved template.
pub fn layout(doc: &ResolvedTemplate) -> Layout {
  let mut header = header_block(&doc.title, &doc.header);
  let mut body_header: &[ResolvedField] = &[];
  if header.height > MAX_HEADER_HEIGHT {
    tracing::warn!(
      fields = doc.header.len(),
      height_mm = header.height,
      "header block too tall to repeat; header fields moved to the first page body"
    );
    header = header_block(&doc.title, &[]);
    body_header = &doc.header;
  }

  let mut flow = Flow::new(header.height);
  flow.header_fields(body_header);
  for section in &doc.sections {
    match section {
      ResolvedSection::Info { title, fields } => flow.info(title, fields),
      ResolvedSection::Text { title, text } => flow.text(title, text),
      ResolvedSection::Table { title, columns, rows } => {
        flow.table(title, columns, rows)
      }
    }
  }
  flow.signatures(&doc.footer);

  let mut pages = flow.finish();
  let total = pages.len();
  for (i, page) in pages.iter_mut().enumerate() {
    let mut ops = header.ops.clone();
    ops.append(&mut page.ops);
    page.ops = ops;
    page_number(page, i + 1, total);
  }

  Layout { pages }
}

// ─── Header and footer ───────────────────────────────────────────────────────

struct HeaderBlock {
  ops:    Vec<Op>,
  /// Where the body starts on every page.
  height: f64,
}

fn header_block(title: &str, fields: &[ResolvedField]) -> HeaderBlock {
  let mut page = Page::default();
  let mut y = MARGIN;

  let mut title_lines = wrap(title, CONTENT_WIDTH, TITLE_SIZE, true);
  shorten(&mut title_lines, MAX_TITLE_LINES, "certificate title");
  for line in title_lines {
    page.text(MARGIN, y, TITLE_SIZE, true, line);
    y += line_height(TITLE_SIZE);
  }
  y += 1.0;

  let col_w = (CONTENT_WIDTH - GRID_GAP) / 2.0;
  let lh = line_height(HEADER_SIZE);
  for row in fields.chunks(2) {
    let mut row_lines = 0;
    for (c, field) in row.iter().enumerate() {
      let x = MARGIN + c as f64 * (col_w + GRID_GAP);
      let lines = wrap(&labelled(field), col_w, HEADER_SIZE, false);
      for (k, line) in lines.iter().enumerate() {
        page.text(x, y + k as f64 * lh, HEADER_SIZE, false, line.as_str());
      }
      row_lines = row_lines.max(lines.len());
    }
    y += row_lines as f64 * lh;
  }

  y += 2.0;
  page.line(MARGIN, y, PAGE_WIDTH - MARGIN, y);

  HeaderBlock { ops: page.ops, height: y + 4.0 }
}

fn labelled(field: &ResolvedField) -> String {
  match (field.label.trim(), field.value.trim()) {
    ("", value) => value.to_owned(),
    (label, "") => format!("{label}:"),
    (label, value) => format!("{label}: {value}"),
  }
}

/// Cut `lines` to `max` and mark the cut with an ellipsis.
fn shorten(lines: &mut Vec<String>, max: usize, what: &str) {
  if lines.len() <= max {
    return;
  }
  tracing::warn!(lines = lines.len(), kept = max, "{what} too long; shortened");
  lines.truncate(max);
  if let Some(last) = lines.last_mut() {
    last.push('…');
  }
}

fn page_number(page: &mut Page, n: usize, total: usize) {
  let text = format!("Página {n} de {total}");
  let rule_y = BODY_BOTTOM + 2.0;
  page.line(MARGIN, rule_y, PAGE_WIDTH - MARGIN, rule_y);
  let x = PAGE_WIDTH - MARGIN - text_width(&text, PAGE_NUMBER_SIZE, false);
  let y = PAGE_HEIGHT - MARGIN - line_height(PAGE_NUMBER_SIZE);
  page.text(x, y, PAGE_NUMBER_SIZE, false, text);
}

// ─── Body flow ───────────────────────────────────────────────────────────────

/// Wrapped lines drawn at one x offset inside a grid row.
struct Column {
  x:     f64,
  bold:  bool,
  lines: Vec<String>,
}

struct Flow {
  done:    Vec<Page>,
  current: Page,
  top:     f64,
  y:       f64,
}

impl Flow {
  fn new(top: f64) -> Self {
    Self { done: Vec::new(), current: Page::default(), top, y: top }
  }

  fn finish(mut self) -> Vec<Page> {
    self.done.push(self.current);
    self.done
  }

  fn break_page(&mut self) {
    self.done.push(std::mem::take(&mut self.current));
    self.y = self.top;
  }

  /// Height available below the header on an empty page.
  fn body_height(&self) -> f64 { BODY_BOTTOM - self.top }

  /// Break first if `height` does not fit below the cursor. A block taller
  /// than a whole page is placed at the top of a fresh one.
  fn reserve(&mut self, height: f64) {
    if self.y + height > BODY_BOTTOM && self.y > self.top {
      self.break_page();
    }
  }

  /// Lines of `size` that fit on an empty page body.
  fn page_lines(&self, size: u8) -> usize {
    (self.body_height() / line_height(size)).floor().max(1.0) as usize
  }

  /// Section title, kept on the same page as the first `keep` millimetres
  /// of the section body.
  fn title(&mut self, title: &str, keep: f64) {
    let title = title.trim();
    if title.is_empty() {
      return;
    }
    let lines = wrap(title, CONTENT_WIDTH, SECTION_TITLE_SIZE, true);
    let lh = line_height(SECTION_TITLE_SIZE);
    self.reserve(lines.len() as f64 * lh + 1.0 + keep);
    for line in lines {
      self.current.text(MARGIN, self.y, SECTION_TITLE_SIZE, true, line);
      self.y += lh;
    }
    self.y += 1.0;
  }

  /// Rows of side-by-side columns. A row that fits on one page is kept
  /// together; a taller one continues line by line on the next pages.
  fn grid(&mut self, rows: &[Vec<Column>], size: u8, row_gap: f64) {
    let lh = line_height(size);
    for row in rows {
      let n = row.iter().map(|c| c.lines.len()).max().unwrap_or(0);
      let h = n as f64 * lh;
      if h <= self.body_height() {
        self.reserve(h);
      }
      for k in 0..n {
        self.reserve(lh);
        for col in row {
          if let Some(line) = col.lines.get(k) {
            self.current.text(col.x, self.y, size, col.bold, line.as_str());
          }
        }
        self.y += lh;
      }
      self.y += row_gap;
    }
  }

  /// Header fields too tall to repeat on every page, printed once at the
  /// start of the body.
  fn header_fields(&mut self, fields: &[ResolvedField]) {
    if fields.is_empty() {
      return;
    }
    let col_w = (CONTENT_WIDTH - GRID_GAP) / 2.0;
    let rows: Vec<Vec<Column>> = fields
      .chunks(2)
      .map(|pair| {
        pair
          .iter()
          .enumerate()
          .map(|(c, f)| Column {
            x:     MARGIN + c as f64 * (col_w + GRID_GAP),
            bold:  false,
            lines: wrap(&labelled(f), col_w, HEADER_SIZE, false),
          })
          .collect()
      })
      .collect();
    self.grid(&rows, HEADER_SIZE, 0.0);
    self.y += SECTION_GAP;
  }

  fn info(&mut self, title: &str, fields: &[ResolvedField]) {
    let cell_w = (CONTENT_WIDTH - GRID_GAP) / 2.0;
    let label_w = cell_w * 0.4;
    let value_w = cell_w - label_w - 2.0;
    let lh = line_height(BODY_SIZE);

    let rows: Vec<Vec<Column>> = fields
      .chunks(2)
      .map(|pair| {
        pair
          .iter()
          .enumerate()
          .flat_map(|(c, f)| {
            let x = MARGIN + c as f64 * (cell_w + GRID_GAP);
            let label = match f.label.trim() {
              "" => Vec::new(),
              l => wrap(&format!("{l}:"), label_w, BODY_SIZE, true),
            };
            [
              Column { x, bold: true, lines: label },
              Column {
                x:     x + label_w + 2.0,
                bold:  false,
                lines: wrap(&f.value, value_w, BODY_SIZE, false),
              },
            ]
          })
          .collect()
      })
      .collect();

    let first = rows
      .first()
      .map(|r| r.iter().map(|c| c.lines.len()).max().unwrap_or(0) as f64 * lh)
      .unwrap_or(0.0);
    let keep = if first <= self.body_height() { first } else { lh };
    self.title(title, keep);

    self.grid(&rows, BODY_SIZE, 1.0);
    self.y += SECTION_GAP;
  }

  fn text(&mut self, title: &str, text: &str) {
    let lh = line_height(BODY_SIZE);
    self.title(title, lh);
    for line in wrap(text, CONTENT_WIDTH, BODY_SIZE, false) {
      self.reserve(lh);
      self.current.text(MARGIN, self.y, BODY_SIZE, false, line);
      self.y += lh;
    }
    self.y += SECTION_GAP;
  }

  fn table(&mut self, title: &str, columns: &[String], rows: &[Vec<String>]) {
    if columns.is_empty() {
      return;
    }
    let col_w = CONTENT_WIDTH / columns.len() as f64;
    let text_w = col_w - 2.0 * CELL_PAD;
    let lh = line_height(TABLE_SIZE);

    let cells = |row: &[String], bold: bool| -> Vec<Vec<String>> {
      (0..columns.len())
        .map(|c| {
          let text = row.get(c).map(String::as_str).unwrap_or("");
          wrap(text, text_w, TABLE_SIZE, bold)
        })
        .collect()
    };
    let height = |lines: usize| lines as f64 * lh + 2.0 * CELL_PAD;

    // The column header repeats on every page the table touches, so it is
    // held to half a page.
    let head_max = (self.page_lines(TABLE_SIZE) / 2).max(1);
    let mut head = cells(columns, true);
    for lines in &mut head {
      shorten(lines, head_max, "table column title");
    }
    let head: Vec<&[String]> = head.iter().map(Vec::as_slice).collect();
    let head_h = height(tallest(&head));
    let body: Vec<Vec<Vec<String>>> = rows.iter().map(|r| cells(r, false)).collect();

    let room = self.body_height() - head_h;
    let first_h = body
      .first()
      .map(|r| height(r.iter().map(Vec::len).max().unwrap_or(0)))
      .unwrap_or(0.0);
    let keep = head_h + if first_h <= room { first_h } else { height(1) };
    self.title(title, keep);
    self.reserve(keep);
    self.row(&head, col_w, head_h, true);

    for row in &body {
      let mut rest: Vec<&[String]> = row.iter().map(Vec::as_slice).collect();
      let h = height(tallest(&rest));
      if self.y + h > BODY_BOTTOM && h <= room {
        self.break_page();
        self.row(&head, col_w, head_h, true);
      }

      // A row taller than the space left continues on the next page.
      loop {
        let need = tallest(&rest);
        let fit = ((BODY_BOTTOM - self.y - 2.0 * CELL_PAD) / lh).floor().max(0.0) as usize;
        if need <= fit {
          self.row(&rest, col_w, height(need), false);
          break;
        }
        if fit > 0 {
          let now: Vec<&[String]> = rest.iter().map(|&c| &c[..fit.min(c.len())]).collect();
          rest = rest.iter().map(|&c| &c[fit.min(c.len())..]).collect();
          self.row(&now, col_w, height(fit), false);
        }
        self.break_page();
        self.row(&head, col_w, head_h, true);
      }
    }
    self.y += SECTION_GAP;
  }

  fn row(&mut self, cells: &[&[String]], col_w: f64, h: f64, bold: bool) {
    let lh = line_height(TABLE_SIZE);
    for (c, lines) in cells.iter().enumerate() {
      let x = MARGIN + c as f64 * col_w;
      self.current.ops.push(Op::Rect { x, y: self.y, w: col_w, h });
      for (k, line) in lines.iter().enumerate() {
        self.current.text(
          x + CELL_PAD,
          self.y + CELL_PAD + k as f64 * lh,
          TABLE_SIZE,
          bold,
          line.as_str(),
        );
      }
    }
    self.y += h;
  }

  /// Signature slots, three per row. The block stays together when it fits
  /// on a page; otherwise its rows break across pages.
  fn signatures(&mut self, fields: &[ResolvedField]) {
    if fields.is_empty() {
      return;
    }
    let rows = fields.len().div_ceil(SIGNATURES_PER_ROW);
    let block = SECTION_GAP + rows as f64 * SIGNATURE_HEIGHT;
    if block <= self.body_height() {
      self.reserve(block);
    }
    self.y += SECTION_GAP;

    let lh = line_height(SIGNATURE_SIZE);
    for row in fields.chunks(SIGNATURES_PER_ROW) {
      self.reserve(SIGNATURE_HEIGHT);
      let slot_w = CONTENT_WIDTH / row.len() as f64;
      for (c, field) in row.iter().enumerate() {
        let x = MARGIN + c as f64 * slot_w;
        let line_y = self.y + SIGNATURE_LINE_OFFSET;
        self.current.line(x + 6.0, line_y, x + slot_w - 6.0, line_y);

        let mut y = line_y + 1.0;
        for (text, bold) in [(field.label.trim(), true), (field.value.trim(), false)] {
          if text.is_empty() {
            continue;
          }
          let w = text_width(text, SIGNATURE_SIZE, bold);
          let tx = x + ((slot_w - w) / 2.0).max(0.0);
          self.current.text(tx, y, SIGNATURE_SIZE, bold, text);
          y += lh;
        }
      }
      self.y += SIGNATURE_HEIGHT;
    }
  }
}

fn tallest(cells: &[&[String]]) -> usize {
  cells.iter().map(|c| c.len()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use sgc_core::template::{FilledValues, TemplateSchema};

  use super::*;

  fn field(label: &str, value: &str) -> ResolvedField {
    ResolvedField { label: label.into(), value: value.into() }
  }

  fn doc(sections: Vec<ResolvedSection>) -> ResolvedTemplate {
    ResolvedTemplate {
      title: "Certificado de análisis".into(),
      header: vec![field("Código", "F-CAL-01"), field("Versión", "3")],
      sections,
      footer: vec![field("Jefe de calidad", ""), field("Gerente", "Ana Ruiz")],
    }
  }

  fn count(page: &Page, needle: &str) -> usize {
    page.texts().filter(|t| *t == needle).count()
  }

  fn text_ops(layout: &Layout) -> impl Iterator<Item = (f64, u8)> + '_ {
    layout.pages.iter().flat_map(|p| &p.ops).filter_map(|op| match op {
      Op::Text { y, size, .. } => Some((*y, *size)),
      _ => None,
    })
  }

  #[test]
  fn short_document_fits_on_one_page() {
    let l = layout(&doc(vec![ResolvedSection::Text {
      title: "Dictamen".into(),
      text:  "El lote cumple.".into(),
    }]));
    assert_eq!(l.page_count(), 1);
    let page = &l.pages[0];
    assert_eq!(count(page, "Certificado de análisis"), 1);
    assert_eq!(count(page, "Código: F-CAL-01"), 1);
    assert_eq!(count(page, "El lote cumple."), 1);
    assert_eq!(count(page, "Página 1 de 1"), 1);
    assert_eq!(count(page, "Jefe de calidad"), 1);
    assert_eq!(count(page, "Ana Ruiz"), 1);
  }

  #[test]
  fn empty_document_still_has_a_page() {
    let l = layout(&ResolvedTemplate {
      title:    "Vacío".into(),
      header:   vec![],
      sections: vec![],
      footer:   vec![],
    });
    assert_eq!(l.page_count(), 1);
    assert_eq!(count(&l.pages[0], "Página 1 de 1"), 1);
  }

  #[test]
  fn long_text_paginates_with_header_and_numbering() {
    let text = (1..=150)
      .map(|i| format!("Línea de observación número {i}."))
      .collect::<Vec<_>>()
      .join("\n");
    let l = layout(&doc(vec![ResolvedSection::Text { title: String::new(), text }]));

    // Full pages of body lines, then the signature block on the last text
    // page or, when it does not fit, on one more page.
    let d = doc(vec![]);
    let top = header_block(&d.title, &d.header).height;
    let lh = line_height(BODY_SIZE);
    let per_page = ((BODY_BOTTOM - top) / lh).floor() as usize;
    let text_pages = 150usize.div_ceil(per_page);
    let last_y = top + (150 - (text_pages - 1) * per_page) as f64 * lh + SECTION_GAP;
    let expected =
      text_pages + usize::from(last_y + SECTION_GAP + SIGNATURE_HEIGHT > BODY_BOTTOM);

    let n = l.page_count() as usize;
    assert!(text_pages >= 3);
    assert_eq!(n, expected);
    for page in &l.pages[..text_pages - 1] {
      assert_eq!(page.texts().filter(|t| t.starts_with("Línea")).count(), per_page);
    }
    for (i, page) in l.pages.iter().enumerate() {
      assert_eq!(count(page, "Certificado de análisis"), 1);
      assert_eq!(count(page, "Versión: 3"), 1);
      assert_eq!(count(page, &format!("Página {} de {n}", i + 1)), 1);
    }

    // Every body line is printed exactly once, in order.
    let body: Vec<&str> = l
      .pages
      .iter()
      .flat_map(Page::texts)
      .filter(|t| t.starts_with("Línea"))
      .collect();
    assert_eq!(body.len(), 150);
    assert_eq!(body[0], "Línea de observación número 1.");
    assert_eq!(body[149], "Línea de observación número 150.");
  }

  #[test]
  fn body_text_stays_inside_printable_area() {
    let text = "palabra ".repeat(3000);
    let l = layout(&doc(vec![ResolvedSection::Text { title: "Notas".into(), text }]));
    assert_inside_printable_area(&l);
  }

  fn assert_inside_printable_area(l: &Layout) {
    for (y, size) in text_ops(l) {
      assert!(y >= MARGIN, "text above the top margin at {y}");
      assert!(
        y + line_height(size) <= PAGE_HEIGHT - MARGIN + 1e-9,
        "text below the bottom margin at {y}"
      );
    }
  }

  fn words(l: &Layout) -> std::collections::HashSet<String> {
    l.pages
      .iter()
      .flat_map(Page::texts)
      .flat_map(str::split_whitespace)
      .map(str::to_owned)
      .collect()
  }

  #[test]
  fn long_info_value_continues_on_next_pages() {
    let value = (0..3000).map(|i| format!("obs{i}")).collect::<Vec<_>>().join(" ");
    let l = layout(&doc(vec![ResolvedSection::Info {
      title:  "Datos".into(),
      fields: vec![field("Observaciones", &value), field("Lote", "L-9")],
    }]));

    assert!(l.page_count() > 1);
    assert_inside_printable_area(&l);
    let seen = words(&l);
    for i in 0..3000 {
      assert!(seen.contains(&format!("obs{i}")), "obs{i} missing");
    }
    assert!(seen.contains("L-9"));
    assert!(l.pages.iter().flat_map(Page::texts).all(|t| !t.contains('…')));
  }

  #[test]
  fn tall_table_cell_splits_and_repeats_header() {
    let note = (0..2000).map(|i| format!("nota{i}")).collect::<Vec<_>>().join(" ");
    let l = layout(&doc(vec![ResolvedSection::Table {
      title:   "Resultados".into(),
      columns: vec!["Parámetro".into(), "Comentario".into()],
      rows:    vec![
        vec!["Humedad".into(), "12 %".into()],
        vec!["Cenizas".into(), note],
        vec!["Proteína".into(), "9 %".into()],
      ],
    }]));

    assert!(l.page_count() > 1);
    assert_inside_printable_area(&l);
    for page in &l.pages {
      assert_eq!(count(page, "Parámetro"), 1, "header row on every page");
    }
    let seen = words(&l);
    for i in 0..2000 {
      assert!(seen.contains(&format!("nota{i}")), "nota{i} missing");
    }
    assert!(seen.contains("Proteína"));
  }

  #[test]
  fn oversized_header_is_printed_once_in_the_body() {
    let header = (0..140)
      .map(|i| field(&format!("Campo {i}"), &format!("valor{i}")))
      .collect();
    let l = layout(&ResolvedTemplate {
      title: "Certificado de análisis".into(),
      header,
      sections: vec![ResolvedSection::Text {
        title: "Dictamen".into(),
        text:  "El lote cumple.".into(),
      }],
      footer: vec![field("Gerente", "Ana Ruiz")],
    });

    assert_inside_printable_area(&l);
    for page in &l.pages {
      assert_eq!(count(page, "Certificado de análisis"), 1);
    }
    let all: Vec<&str> = l.pages.iter().flat_map(Page::texts).collect();
    for i in 0..140 {
      let expected = format!("Campo {i}: valor{i}");
      assert_eq!(all.iter().filter(|t| **t == expected).count(), 1, "{expected}");
    }
    assert!(all.contains(&"El lote cumple."));
  }

  #[test]
  fn many_signatures_break_across_pages() {
    let footer: Vec<_> = (0..60).map(|i| field(&format!("Firma {i}"), "")).collect();
    let l = layout(&ResolvedTemplate {
      title: "Acta".into(),
      header: vec![],
      sections: vec![],
      footer,
    });

    assert!(l.page_count() > 1);
    assert_inside_printable_area(&l);
    let all: Vec<&str> = l.pages.iter().flat_map(Page::texts).collect();
    for i in 0..60 {
      assert!(all.contains(&format!("Firma {i}").as_str()));
    }
  }

  #[test]
  fn table_header_repeats_after_page_break() {
    let rows = (0..120)
      .map(|i| vec![format!("Parámetro {i}"), format!("{i}.0 mg/kg")])
      .collect();
    let l = layout(&doc(vec![ResolvedSection::Table {
      title:   "Resultados".into(),
      columns: vec!["Parámetro".into(), "Resultado".into()],
      rows,
    }]));

    assert!(l.page_count() > 1);
    for page in &l.pages {
      assert_eq!(count(page, "Parámetro"), 1, "header row on every page");
    }
    assert_eq!(count(&l.pages[0], "Resultados"), 1);
    assert_eq!(count(&l.pages[1], "Resultados"), 0);
  }

  #[test]
  fn signature_block_is_on_the_last_page_only() {
    let text = "x\n".repeat(120);
    let l = layout(&doc(vec![ResolvedSection::Text { title: String::new(), text }]));
    let last = l.pages.len() - 1;
    for (i, page) in l.pages.iter().enumerate() {
      let expected = usize::from(i == last);
      assert_eq!(count(page, "Jefe de calidad"), expected);
    }
  }

  #[test]
  fn info_section_lays_out_pairs_side_by_side() {
    let l = layout(&doc(vec![ResolvedSection::Info {
      title:  "Datos".into(),
      fields: vec![field("Lote", "L-1"), field("Cliente", "Acme")],
    }]));
    let pos = |needle: &str| {
      l.pages[0].ops.iter().find_map(|op| match op {
        Op::Text { x, y, text, .. } if text == needle => Some((*x, *y)),
        _ => None,
      })
    };
    let (lote_x, lote_y) = pos("Lote:").unwrap();
    let (cliente_x, cliente_y) = pos("Cliente:").unwrap();
    assert_eq!(lote_y, cliente_y);
    assert!(cliente_x > lote_x);
    assert!(pos("L-1").is_some());
  }

  #[test]
  fn legacy_and_current_schemas_lay_out_identically() {
    let sections = json!([
      { "type": "info", "title": "Datos", "fields": [
        { "label": "Producto", "value": "Harina" },
        { "key": "lote", "label": "Lote", "editable": true }
      ]},
      { "type": "texto", "content": "Se certifica que el producto cumple." },
      { "type": "table", "columns": ["A", "B"], "rows": [["1", "2"]] }
    ]);
    let legacy = TemplateSchema::from_value(sections.clone()).unwrap();
    let current =
      TemplateSchema::from_value(json!({ "secciones": sections })).unwrap();

    let mut values = FilledValues::default();
    values.fields.insert("lote".into(), "L-77".into());

    let a = layout(&legacy.resolve("Certificado", &values).unwrap());
    let b = layout(&current.resolve("Certificado", &values).unwrap());
    assert_eq!(a, b);
    assert!(a.pages[0].texts().any(|t| t == "L-77"));
  }
}
