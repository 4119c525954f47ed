//! Built-in font metrics for layout.
//!
//! Widths approximate Helvetica / Liberation Sans in 1/1000 em. The layout
//! engine only needs them to decide line breaks and centring, so a small
//! table is enough and keeps layout independent of which TTF the PDF writer
//! ends up embedding.

/// Millimetres per typographic point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.3;

fn advance(c: char) -> u16 {
  match c {
    ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' | 'í' => 278,
    'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' | '"' => 333,
    'm' | 'M' => 833,
    'w' => 722,
    'W' => 944,
    'I' => 278,
    '0'..='9' | '$' | '#' | '_' => 556,
    '%' => 889,
    '@' => 1015,
    c if c.is_uppercase() => 667,
    _ => 556,
  }
}

/// Width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, size: u8, bold: bool) -> f64 {
  let units: u32 = text.chars().map(|c| u32::from(advance(c))).sum();
  let scale = if bold { 1.06 } else { 1.0 };
  f64::from(units) / 1000.0 * f64::from(size) * MM_PER_PT * scale
}

/// Vertical advance of one line in millimetres.
pub fn line_height(size: u8) -> f64 { f64::from(size) * MM_PER_PT * LINE_SPACING }

/// Greedy word wrap to `max_width` millimetres. Explicit newlines are kept,
/// and words wider than a whole line are split between characters. Always
/// returns at least one (possibly empty) line.
pub fn wrap(text: &str, max_width: f64, size: u8, bold: bool) -> Vec<String> {
  let fits = |s: &str| text_width(s, size, bold) <= max_width;
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    let mut line = String::new();
    for word in paragraph.split_whitespace() {
      let candidate = if line.is_empty() {
        word.to_owned()
      } else {
        format!("{line} {word}")
      };
      if fits(&candidate) {
        line = candidate;
        continue;
      }
      if !line.is_empty() {
        lines.push(std::mem::take(&mut line));
      }
      if fits(word) {
        line = word.to_owned();
        continue;
      }
      for c in word.chars() {
        line.push(c);
        if !fits(&line) && line.chars().count() > 1 {
          line.pop();
          lines.push(std::mem::take(&mut line));
          line.push(c);
        }
      }
    }
    lines.push(line);
  }

  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wider_for_bold_and_larger_sizes() {
    let w = text_width("Certificado", 10, false);
    assert!(w > 0.0);
    assert!(text_width("Certificado", 10, true) > w);
    assert!((text_width("Certificado", 20, false) - 2.0 * w).abs() < 1e-9);
  }

  #[test]
  fn wrap_respects_width() {
    let text = "el lote cumple con todos los parámetros fisicoquímicos evaluados";
    let lines = wrap(text, 40.0, 10, false);
    assert!(lines.len() > 1);
    assert!(lines.iter().all(|l| text_width(l, 10, false) <= 40.0));
    assert_eq!(lines.join(" "), text);
  }

  #[test]
  fn wrap_keeps_newlines_and_empty_text() {
    assert_eq!(wrap("", 50.0, 10, false), vec![String::new()]);
    assert_eq!(wrap("a\n\nb", 50.0, 10, false), vec!["a", "", "b"]);
  }

  #[test]
  fn wrap_splits_overlong_words() {
    let word = "x".repeat(200);
    let lines = wrap(&word, 20.0, 10, false);
    assert!(lines.len() > 1);
    assert_eq!(lines.concat(), word);
  }
}
