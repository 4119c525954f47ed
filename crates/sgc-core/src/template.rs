//! Certificate template schemas ("plantillas").
//!
//! A schema is a header (a list of fields), ordered body sections and a
//! footer (signature fields). Two JSON shapes exist in stored data:
//!
//! - the legacy flat array, which is just the body sections:
//!   `[{"type": "info", ...}, {"type": "text", ...}]`
//! - the current object: `{"header": [...], "secciones": [...], "footer": [...]}`
//!
//! [`TemplateSchema::from_value`] accepts both and always yields the object
//! form.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Schema ──────────────────────────────────────────────────────────────────

/// A single labelled value. Fixed fields always print `value`; editable
/// fields print the filled-in value when one is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
  /// Assigned from the field's position when left blank.
  #[serde(default, alias = "id")]
  pub key:      String,
  #[serde(default, alias = "etiqueta")]
  pub label:    String,
  #[serde(default, alias = "valor")]
  pub value:    String,
  #[serde(default)]
  pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
  /// Label/value pairs laid out in a two-column grid.
  Info {
    #[serde(default, alias = "titulo")]
    title:  String,
    #[serde(default, alias = "campos")]
    fields: Vec<TemplateField>,
  },
  /// A paragraph of flowing text.
  #[serde(alias = "texto")]
  Text {
    #[serde(default, alias = "titulo")]
    title:    String,
    #[serde(default, alias = "id")]
    key:      String,
    #[serde(default, alias = "contenido")]
    content:  String,
    #[serde(default)]
    editable: bool,
  },
  /// A bordered grid with a header row.
  #[serde(alias = "tabla")]
  Table {
    #[serde(default, alias = "titulo")]
    title:    String,
    #[serde(default, alias = "id")]
    key:      String,
    #[serde(alias = "columnas")]
    columns:  Vec<String>,
    #[serde(default, alias = "filas")]
    rows:     Vec<Vec<String>>,
    #[serde(default)]
    editable: bool,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSchema {
  #[serde(default, alias = "encabezado")]
  pub header:   Vec<TemplateField>,
  #[serde(default, alias = "secciones")]
  pub sections: Vec<Section>,
  #[serde(default, alias = "pie")]
  pub footer:   Vec<TemplateField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSchema {
  Legacy(Vec<Section>),
  Current(TemplateSchema),
}

impl TemplateSchema {
  /// Parse either stored shape, assign missing keys and validate.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    let stored: StoredSchema = serde_json::from_value(value).map_err(|e| {
      Error::Validation(format!("unrecognised template schema: {e}"))
    })?;
    let mut schema = match stored {
      StoredSchema::Legacy(sections) => TemplateSchema {
        sections,
        ..TemplateSchema::default()
      },
      StoredSchema::Current(schema) => schema,
    };
    schema.assign_keys();
    schema.validate()?;
    Ok(schema)
  }

  /// Give every keyless field a key derived from where it sits, so that
  /// equivalent content gets the same keys regardless of the stored shape.
  fn assign_keys(&mut self) {
    fn fill(key: &mut String, fallback: impl FnOnce() -> String) {
      if key.trim().is_empty() {
        *key = fallback();
      }
    }

    for (i, f) in self.header.iter_mut().enumerate() {
      fill(&mut f.key, || format!("header.{i}"));
    }
    for (i, f) in self.footer.iter_mut().enumerate() {
      fill(&mut f.key, || format!("footer.{i}"));
    }
    for (i, section) in self.sections.iter_mut().enumerate() {
      match section {
        Section::Info { fields, .. } => {
          for (j, f) in fields.iter_mut().enumerate() {
            fill(&mut f.key, || format!("section.{i}.{j}"));
          }
        }
        Section::Text { key, .. } | Section::Table { key, .. } => {
          fill(key, || format!("section.{i}"));
        }
      }
    }
  }

  fn validate(&self) -> Result<()> {
    let mut seen = HashSet::new();
    let mut check_key = |key: &str| {
      if seen.insert(key.to_owned()) {
        Ok(())
      } else {
        Err(Error::Validation(format!("duplicate field key {key:?}")))
      }
    };

    for f in self.header.iter().chain(&self.footer) {
      check_key(f.key.as_str())?;
    }
    for section in &self.sections {
      match section {
        Section::Info { fields, .. } => {
          for f in fields {
            check_key(f.key.as_str())?;
          }
        }
        Section::Text { key, .. } => check_key(key.as_str())?,
        Section::Table { key, columns, rows, .. } => {
          check_key(key.as_str())?;
          if columns.is_empty() {
            return Err(Error::Validation(format!(
              "table {key:?} has no columns"
            )));
          }
          check_rows(key, columns.len(), rows)?;
        }
      }
    }
    Ok(())
  }

  /// Substitute filled values into the schema, producing exactly what gets
  /// printed.
  pub fn resolve(
    &self,
    title: &str,
    values: &FilledValues,
  ) -> Result<ResolvedTemplate> {
    let pairs = |fields: &[TemplateField]| -> Vec<ResolvedField> {
      fields.iter().map(|f| f.resolve(values)).collect()
    };

    let mut sections = Vec::with_capacity(self.sections.len());
    for section in &self.sections {
      sections.push(match section {
        Section::Info { title, fields } => ResolvedSection::Info {
          title:  title.clone(),
          fields: pairs(fields),
        },
        Section::Text { title, key, content, editable } => {
          let text = editable
            .then(|| values.fields.get(key))
            .flatten()
            .unwrap_or(content);
          ResolvedSection::Text { title: title.clone(), text: text.clone() }
        }
        Section::Table { title, key, columns, rows, editable } => {
          let rows = match editable.then(|| values.tables.get(key)).flatten() {
            Some(filled) => {
              check_rows(key, columns.len(), filled)?;
              filled.clone()
            }
            None => rows.clone(),
          };
          ResolvedSection::Table {
            title:   title.clone(),
            columns: columns.clone(),
            rows,
          }
        }
      });
    }

    Ok(ResolvedTemplate {
      title: title.to_owned(),
      header: pairs(&self.header),
      sections,
      footer: pairs(&self.footer),
    })
  }
}

fn check_rows(key: &str, width: usize, rows: &[Vec<String>]) -> Result<()> {
  match rows.iter().position(|r| r.len() != width) {
    Some(i) => Err(Error::Validation(format!(
      "table {key:?} row {i} has {} cells, expected {width}",
      rows[i].len()
    ))),
    None => Ok(()),
  }
}

impl TemplateField {
  fn resolve(&self, values: &FilledValues) -> ResolvedField {
    let value = self
      .editable
      .then(|| values.fields.get(&self.key))
      .flatten()
      .unwrap_or(&self.value);
    ResolvedField { label: self.label.clone(), value: value.clone() }
  }
}

// ─── Filled values ───────────────────────────────────────────────────────────

/// What the user typed into the generation form, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledValues {
  #[serde(default)]
  pub fields: BTreeMap<String, String>,
  #[serde(default)]
  pub tables: BTreeMap<String, Vec<Vec<String>>>,
}

// ─── Resolved form ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
  pub label: String,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSection {
  Info { title: String, fields: Vec<ResolvedField> },
  Text { title: String, text: String },
  Table { title: String, columns: Vec<String>, rows: Vec<Vec<String>> },
}

/// A schema with all values substituted; the input to the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
  pub title:    String,
  pub header:   Vec<ResolvedField>,
  pub sections: Vec<ResolvedSection>,
  pub footer:   Vec<ResolvedField>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn sections_json() -> serde_json::Value {
    json!([
      {
        "type": "info",
        "title": "Datos del lote",
        "fields": [
          { "label": "Producto", "value": "Harina", "editable": false },
          { "key": "lote", "label": "Lote", "editable": true }
        ]
      },
      { "type": "text", "content": "Se certifica que el producto cumple." },
      {
        "type": "table",
        "key": "analisis",
        "columns": ["Parámetro", "Resultado"],
        "rows": [["Humedad", "12%"]],
        "editable": true
      }
    ])
  }

  #[test]
  fn legacy_and_current_shapes_normalize_identically() {
    let legacy = TemplateSchema::from_value(sections_json()).unwrap();
    let current = TemplateSchema::from_value(
      json!({ "header": [], "secciones": sections_json(), "footer": [] }),
    )
    .unwrap();
    assert_eq!(legacy, current);
    assert_eq!(legacy.sections.len(), 3);
  }

  #[test]
  fn spanish_aliases_are_accepted() {
    let schema = TemplateSchema::from_value(json!({
      "encabezado": [{ "etiqueta": "Código", "valor": "F-01" }],
      "secciones": [{ "type": "tabla", "titulo": "Análisis", "columnas": ["A"] }],
      "pie": [{ "etiqueta": "Jefe de calidad" }]
    }))
    .unwrap();
    assert_eq!(schema.header[0].label, "Código");
    assert!(matches!(schema.sections[0], Section::Table { .. }));
    assert_eq!(schema.footer[0].key, "footer.0");
  }

  #[test]
  fn missing_keys_are_positional() {
    let schema = TemplateSchema::from_value(sections_json()).unwrap();
    let Section::Info { fields, .. } = &schema.sections[0] else {
      panic!("expected info section");
    };
    assert_eq!(fields[0].key, "section.0.0");
    assert_eq!(fields[1].key, "lote");
    assert!(matches!(&schema.sections[1], Section::Text { key, .. } if key == "section.1"));
  }

  #[test]
  fn duplicate_keys_are_rejected() {
    let err = TemplateSchema::from_value(json!({
      "header": [{ "key": "a" }],
      "footer": [{ "key": "a" }]
    }));
    assert!(matches!(err, Err(Error::Validation(_))));
  }

  #[test]
  fn ragged_table_rows_are_rejected() {
    let err = TemplateSchema::from_value(json!([
      { "type": "table", "columns": ["A", "B"], "rows": [["1"]] }
    ]));
    assert!(matches!(err, Err(Error::Validation(_))));
  }

  #[test]
  fn not_a_schema_is_rejected() {
    assert!(TemplateSchema::from_value(json!("hola")).is_err());
  }

  #[test]
  fn resolve_respects_editable_flag() {
    let schema = TemplateSchema::from_value(sections_json()).unwrap();
    let mut values = FilledValues::default();
    values.fields.insert("lote".into(), "L-2291".into());
    // Fixed field: a filled value must be ignored.
    values.fields.insert("section.0.0".into(), "Azúcar".into());
    values.tables.insert(
      "analisis".into(),
      vec![vec!["Humedad".into(), "11%".into()], vec!["Cenizas".into(), "0.5%".into()]],
    );

    let resolved = schema.resolve("Certificado de calidad", &values).unwrap();
    let ResolvedSection::Info { fields, .. } = &resolved.sections[0] else {
      panic!("expected info section");
    };
    assert_eq!(fields[0].value, "Harina");
    assert_eq!(fields[1].value, "L-2291");
    let ResolvedSection::Table { rows, .. } = &resolved.sections[2] else {
      panic!("expected table section");
    };
    assert_eq!(rows.len(), 2);
  }

  #[test]
  fn resolve_rejects_ragged_filled_rows() {
    let schema = TemplateSchema::from_value(sections_json()).unwrap();
    let mut values = FilledValues::default();
    values.tables.insert("analisis".into(), vec![vec!["solo".into()]]);
    assert!(matches!(
      schema.resolve("x", &values),
      Err(Error::Validation(_))
    ));
  }
}
