//! ACPM: corrective, preventive and improvement action plans.
//!
//! An ACPM moves forward through `open → in_progress → closed` and never
//! back. Entering `closed` requires evidence: a link to an uploaded drive file
//! or any external URL.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcpmKind {
  Corrective,
  Preventive,
  Improvement,
}

/// Lifecycle state. Serialised in snake case; [`fmt::Display`] gives the
/// label shown to users ("Abierta", "En Progreso", "Cerrada").
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AcpmStatus {
  #[default]
  Open,
  InProgress,
  Closed,
}

impl AcpmStatus {
  /// Forward-only moves; there is no reopening path.
  pub fn can_transition_to(self, next: AcpmStatus) -> bool {
    matches!(
      (self, next),
      (Self::Open, Self::InProgress)
        | (Self::Open, Self::Closed)
        | (Self::InProgress, Self::Closed)
    )
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Open => "Abierta",
      Self::InProgress => "En Progreso",
      Self::Closed => "Cerrada",
    }
  }
}

impl fmt::Display for AcpmStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.label())
  }
}

/// Where the need for an action plan was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  Report,
  Audit,
  Other,
}

/// Structured origin of an ACPM, optionally pointing at the record that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcpmSource {
  pub kind:         SourceKind,
  #[serde(default)]
  pub reference_id: Option<Uuid>,
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acpm {
  pub acpm_id:         Uuid,
  pub kind:            AcpmKind,
  /// Free-text origin as typed by the user.
  pub origin:          String,
  pub source:          Option<AcpmSource>,
  pub description:     String,
  pub action_plan:     String,
  pub responsible:     String,
  pub due_date:        NaiveDate,
  pub root_cause:      Option<String>,
  pub status:          AcpmStatus,
  pub closure_comment: Option<String>,
  pub evidence_url:    Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub closed_at:       Option<DateTime<Utc>>,
}

impl Acpm {
  pub fn is_overdue(&self, today: NaiveDate) -> bool {
    self.status != AcpmStatus::Closed && self.due_date < today
  }
}

/// Input to [`crate::store::AcpmStore::create_acpm`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAcpm {
  pub kind:            AcpmKind,
  #[serde(default)]
  pub origin:          String,
  #[serde(default)]
  pub source:          Option<AcpmSource>,
  pub description:     String,
  #[serde(default)]
  pub action_plan:     String,
  pub responsible:     String,
  pub due_date:        NaiveDate,
  #[serde(default)]
  pub root_cause:      Option<String>,
  #[serde(default)]
  pub status:          AcpmStatus,
  #[serde(default)]
  pub closure_comment: Option<String>,
  #[serde(default)]
  pub evidence_url:    Option<String>,
}

/// Partial edit of the descriptive fields. Status, closure and evidence only
/// change through [`AcpmTransition`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcpmUpdate {
  pub kind:        Option<AcpmKind>,
  pub origin:      Option<String>,
  pub description: Option<String>,
  pub action_plan: Option<String>,
  pub responsible: Option<String>,
  pub due_date:    Option<NaiveDate>,
  pub root_cause:  Option<String>,
}

/// A status change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcpmTransition {
  pub status:          AcpmStatus,
  #[serde(default)]
  pub closure_comment: Option<String>,
  #[serde(default)]
  pub evidence_url:    Option<String>,
}

/// Filters for [`crate::store::AcpmStore::list_acpms`].
#[derive(Debug, Clone, Default)]
pub struct AcpmQuery {
  pub status:      Option<AcpmStatus>,
  pub kind:        Option<AcpmKind>,
  pub responsible: Option<String>,
  /// Only ACPMs escalated from this report.
  pub report_id:   Option<Uuid>,
  /// Only ACPMs that are not closed and past due as of this date.
  pub overdue_on:  Option<NaiveDate>,
}

impl AcpmQuery {
  pub fn matches(&self, acpm: &Acpm) -> bool {
    self.status.is_none_or(|s| acpm.status == s)
      && self.kind.is_none_or(|k| acpm.kind == k)
      && self
        .responsible
        .as_deref()
        .is_none_or(|r| acpm.responsible.eq_ignore_ascii_case(r))
      && self.report_id.is_none_or(|id| {
        acpm.source.as_ref().is_some_and(|s| {
          s.kind == SourceKind::Report && s.reference_id == Some(id)
        })
      })
      && self.overdue_on.is_none_or(|today| acpm.is_overdue(today))
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Returns the trimmed evidence if any is present.
pub fn evidence(url: Option<&str>) -> Option<&str> {
  url.map(str::trim).filter(|u| !u.is_empty())
}

/// Validate a new ACPM before it is persisted.
pub fn check_new(input: &NewAcpm) -> Result<()> {
  if input.description.trim().is_empty() {
    return Err(Error::Validation("description must not be empty".into()));
  }
  if input.responsible.trim().is_empty() {
    return Err(Error::Validation("responsible must not be empty".into()));
  }
  if input.status == AcpmStatus::Closed
    && evidence(input.evidence_url.as_deref()).is_none()
  {
    return Err(Error::MissingEvidence);
  }
  Ok(())
}

/// Validate a status change against the current record.
///
/// Evidence may come with the transition itself or already be on record.
pub fn check_transition(current: &Acpm, t: &AcpmTransition) -> Result<()> {
  if current.status == AcpmStatus::Closed {
    return Err(Error::AcpmClosed(current.acpm_id));
  }
  if !current.status.can_transition_to(t.status) {
    return Err(Error::InvalidTransition { from: current.status, to: t.status });
  }
  if t.status == AcpmStatus::Closed
    && evidence(t.evidence_url.as_deref())
      .or(evidence(current.evidence_url.as_deref()))
      .is_none()
  {
    return Err(Error::MissingEvidence);
  }
  Ok(())
}

/// Apply a validated transition in memory; the caller persists the result.
pub fn apply_transition(
  mut acpm: Acpm,
  t: AcpmTransition,
  now: DateTime<Utc>,
) -> Result<Acpm> {
  check_transition(&acpm, &t)?;
  if let Some(url) = evidence(t.evidence_url.as_deref()) {
    acpm.evidence_url = Some(url.to_owned());
  }
  if t.closure_comment.is_some() {
    acpm.closure_comment = t.closure_comment;
  }
  if t.status == AcpmStatus::Closed {
    acpm.closed_at = Some(now);
  }
  acpm.status = t.status;
  acpm.updated_at = now;
  Ok(acpm)
}

/// Apply a descriptive edit in memory. Closed ACPMs are frozen.
pub fn apply_update(
  mut acpm: Acpm,
  u: AcpmUpdate,
  now: DateTime<Utc>,
) -> Result<Acpm> {
  if acpm.status == AcpmStatus::Closed {
    return Err(Error::AcpmClosed(acpm.acpm_id));
  }
  if let Some(kind) = u.kind {
    acpm.kind = kind;
  }
  if let Some(origin) = u.origin {
    acpm.origin = origin;
  }
  if let Some(description) = u.description {
    if description.trim().is_empty() {
      return Err(Error::Validation("description must not be empty".into()));
    }
    acpm.description = description;
  }
  if let Some(plan) = u.action_plan {
    acpm.action_plan = plan;
  }
  if let Some(responsible) = u.responsible {
    if responsible.trim().is_empty() {
      return Err(Error::Validation("responsible must not be empty".into()));
    }
    acpm.responsible = responsible;
  }
  if let Some(due) = u.due_date {
    acpm.due_date = due;
  }
  if u.root_cause.is_some() {
    acpm.root_cause = u.root_cause;
  }
  acpm.updated_at = now;
  Ok(acpm)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn open_acpm() -> Acpm {
    let now = Utc::now();
    Acpm {
      acpm_id:         Uuid::new_v4(),
      kind:            AcpmKind::Corrective,
      origin:          "Inspección de plagas".into(),
      source:          None,
      description:     "Trampa dañada en bodega 2".into(),
      action_plan:     "Reemplazar trampa".into(),
      responsible:     "Jefe de calidad".into(),
      due_date:        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
      root_cause:      None,
      status:          AcpmStatus::Open,
      closure_comment: None,
      evidence_url:    None,
      created_at:      now,
      updated_at:      now,
      closed_at:       None,
    }
  }

  fn to(status: AcpmStatus, evidence_url: Option<&str>) -> AcpmTransition {
    AcpmTransition {
      status,
      closure_comment: None,
      evidence_url: evidence_url.map(str::to_owned),
    }
  }

  #[test]
  fn forward_transitions_only() {
    use AcpmStatus::*;
    assert!(Open.can_transition_to(InProgress));
    assert!(Open.can_transition_to(Closed));
    assert!(InProgress.can_transition_to(Closed));
    assert!(!InProgress.can_transition_to(Open));
    assert!(!Closed.can_transition_to(Open));
    assert!(!Open.can_transition_to(Open));
  }

  #[test]
  fn closing_without_evidence_is_rejected() {
    let acpm = open_acpm();
    let err = check_transition(&acpm, &to(AcpmStatus::Closed, None));
    assert!(matches!(err, Err(Error::MissingEvidence)));

    let err = check_transition(&acpm, &to(AcpmStatus::Closed, Some("   ")));
    assert!(matches!(err, Err(Error::MissingEvidence)));
  }

  #[test]
  fn closing_with_link_sets_closed_at() {
    let now = Utc::now();
    let closed = apply_transition(
      open_acpm(),
      to(AcpmStatus::Closed, Some(" https://example.com/acta.pdf ")),
      now,
    )
    .unwrap();
    assert_eq!(closed.status, AcpmStatus::Closed);
    assert_eq!(closed.closed_at, Some(now));
    assert_eq!(
      closed.evidence_url.as_deref(),
      Some("https://example.com/acta.pdf")
    );
  }

  #[test]
  fn evidence_on_record_satisfies_guard() {
    let mut acpm = open_acpm();
    acpm.evidence_url = Some("/drive/archivo/x".into());
    assert!(check_transition(&acpm, &to(AcpmStatus::Closed, None)).is_ok());
  }

  #[test]
  fn closed_acpm_is_frozen() {
    let mut acpm = open_acpm();
    acpm.status = AcpmStatus::Closed;
    assert!(matches!(
      check_transition(&acpm, &to(AcpmStatus::InProgress, None)),
      Err(Error::AcpmClosed(_))
    ));
    assert!(matches!(
      apply_update(acpm, AcpmUpdate::default(), Utc::now()),
      Err(Error::AcpmClosed(_))
    ));
  }

  #[test]
  fn overdue_ignores_closed() {
    let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
    let mut acpm = open_acpm();
    assert!(acpm.is_overdue(today));
    acpm.status = AcpmStatus::Closed;
    assert!(!acpm.is_overdue(today));
  }

  #[test]
  fn status_labels() {
    assert_eq!(AcpmStatus::InProgress.to_string(), "En Progreso");
    assert_eq!(
      serde_json::to_string(&AcpmStatus::InProgress).unwrap(),
      "\"in_progress\""
    );
  }
}
