//! Operational checklist reports ("reportes").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The answer to a single checklist question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  /// "Cumple" / "No cumple".
  Complies(bool),
  Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
  pub question: String,
  pub answer:   Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub report_id:    Uuid,
  /// Free-form module or program tag, e.g. `"plagas"` or `"agua"`.
  pub category:     String,
  pub title:        String,
  pub answers:      Vec<ChecklistItem>,
  pub passed:       bool,
  pub evidence_url: Option<String>,
  pub verified:     bool,
  pub acpm_id:      Option<Uuid>,
  pub created_by:   Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ReportStore::create_report`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
  pub category:     String,
  #[serde(default)]
  pub title:        String,
  #[serde(default)]
  pub answers:      Vec<ChecklistItem>,
  /// Computed from `answers` when omitted.
  #[serde(default)]
  pub passed:       Option<bool>,
  #[serde(default)]
  pub evidence_url: Option<String>,
  #[serde(default)]
  pub created_by:   Option<String>,
}

/// A report passes when every yes/no answer complies. Free-text answers do
/// not affect the outcome.
pub fn compute_passed(answers: &[ChecklistItem]) -> bool {
  answers
    .iter()
    .all(|item| !matches!(item.answer, Answer::Complies(false)))
}

impl NewReport {
  pub fn validate(&self) -> Result<()> {
    if self.category.trim().is_empty() {
      return Err(Error::Validation("category must not be empty".into()));
    }
    if let Some(item) = self.answers.iter().find(|i| i.question.trim().is_empty())
    {
      return Err(Error::Validation(format!(
        "checklist answer {:?} has no question",
        item.answer
      )));
    }
    Ok(())
  }

  pub fn resolved_passed(&self) -> bool {
    self.passed.unwrap_or_else(|| compute_passed(&self.answers))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(q: &str, a: Answer) -> ChecklistItem {
    ChecklistItem { question: q.into(), answer: a }
  }

  #[test]
  fn passes_when_all_boolean_answers_comply() {
    let answers = vec![
      item("¿Trampas en su lugar?", Answer::Complies(true)),
      item("Observaciones", Answer::Text("sin novedad".into())),
    ];
    assert!(compute_passed(&answers));
  }

  #[test]
  fn fails_on_any_non_compliance() {
    let answers = vec![
      item("¿Cloro dentro de rango?", Answer::Complies(true)),
      item("¿pH dentro de rango?", Answer::Complies(false)),
    ];
    assert!(!compute_passed(&answers));
  }

  #[test]
  fn answers_deserialize_untagged() {
    let json = r#"[{"question":"a","answer":true},{"question":"b","answer":"ok"}]"#;
    let items: Vec<ChecklistItem> = serde_json::from_str(json).unwrap();
    assert_eq!(items[0].answer, Answer::Complies(true));
    assert_eq!(items[1].answer, Answer::Text("ok".into()));
  }

  #[test]
  fn explicit_passed_overrides_computation() {
    let report = NewReport {
      category:     "agua".into(),
      title:        String::new(),
      answers:      vec![item("¿pH?", Answer::Complies(false))],
      passed:       Some(true),
      evidence_url: None,
      created_by:   None,
    };
    assert!(report.resolved_passed());
  }
}
