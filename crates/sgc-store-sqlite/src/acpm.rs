//! [`AcpmStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use sgc_core::{
  acpm::{
    Acpm, AcpmQuery, AcpmTransition, AcpmUpdate, NewAcpm, apply_transition,
    apply_update, check_new, evidence,
  },
  store::AcpmStore,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    ACPM_COLUMNS, RawAcpm, encode_acpm_kind, encode_date, encode_dt,
    encode_source_kind, encode_status, encode_uuid,
  },
};

pub(crate) fn select_acpm(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawAcpm>> {
  conn
    .query_row(
      &format!("SELECT {ACPM_COLUMNS} FROM acpms WHERE acpm_id = ?1"),
      [id],
      RawAcpm::from_row,
    )
    .optional()
}

/// Build a fully-populated ACPM from creation input.
pub(crate) fn new_acpm(input: NewAcpm) -> Result<Acpm> {
  check_new(&input)?;
  let now = Utc::now();
  let closed = input.status == sgc_core::acpm::AcpmStatus::Closed;
  let evidence_url = evidence(input.evidence_url.as_deref()).map(str::to_owned);

  Ok(Acpm {
    acpm_id: Uuid::new_v4(),
    kind: input.kind,
    origin: input.origin,
    source: input.source,
    description: input.description,
    action_plan: input.action_plan,
    responsible: input.responsible,
    due_date: input.due_date,
    root_cause: input.root_cause,
    status: input.status,
    closure_comment: input.closure_comment,
    evidence_url,
    created_at: now,
    updated_at: now,
    closed_at: closed.then_some(now),
  })
}

/// Column values for an ACPM row, owned so they can move into a
/// connection closure.
pub(crate) struct AcpmRow {
  acpm_id:         String,
  kind:            &'static str,
  origin:          String,
  source_kind:     Option<&'static str>,
  source_ref:      Option<String>,
  description:     String,
  action_plan:     String,
  responsible:     String,
  due_date:        String,
  root_cause:      Option<String>,
  status:          &'static str,
  closure_comment: Option<String>,
  evidence_url:    Option<String>,
  created_at:      String,
  updated_at:      String,
  closed_at:       Option<String>,
}

impl AcpmRow {
  pub(crate) fn new(a: &Acpm) -> Self {
    Self {
      acpm_id:         encode_uuid(a.acpm_id),
      kind:            encode_acpm_kind(a.kind),
      origin:          a.origin.clone(),
      source_kind:     a.source.as_ref().map(|s| encode_source_kind(s.kind)),
      source_ref:      a
        .source
        .as_ref()
        .and_then(|s| s.reference_id)
        .map(encode_uuid),
      description:     a.description.clone(),
      action_plan:     a.action_plan.clone(),
      responsible:     a.responsible.clone(),
      due_date:        encode_date(a.due_date),
      root_cause:      a.root_cause.clone(),
      status:          encode_status(a.status),
      closure_comment: a.closure_comment.clone(),
      evidence_url:    a.evidence_url.clone(),
      created_at:      encode_dt(a.created_at),
      updated_at:      encode_dt(a.updated_at),
      closed_at:       a.closed_at.map(encode_dt),
    }
  }

  pub(crate) fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
      &format!(
        "INSERT INTO acpms ({ACPM_COLUMNS}) VALUES
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
      ),
      rusqlite::params![
        self.acpm_id,
        self.kind,
        self.origin,
        self.source_kind,
        self.source_ref,
        self.description,
        self.action_plan,
        self.responsible,
        self.due_date,
        self.root_cause,
        self.status,
        self.closure_comment,
        self.evidence_url,
        self.created_at,
        self.updated_at,
        self.closed_at,
      ],
    )
  }

  /// Overwrite the mutable columns, but only if the stored status is still
  /// `expected_status`. Returns the number of rows written.
  fn update_if(&self, conn: &Connection, expected_status: &str) -> rusqlite::Result<usize> {
    conn.execute(
      "UPDATE acpms SET
         kind = ?2, origin = ?3, description = ?4, action_plan = ?5,
         responsible = ?6, due_date = ?7, root_cause = ?8, status = ?9,
         closure_comment = ?10, evidence_url = ?11, updated_at = ?12,
         closed_at = ?13
       WHERE acpm_id = ?1 AND status = ?14",
      rusqlite::params![
        self.acpm_id,
        self.kind,
        self.origin,
        self.description,
        self.action_plan,
        self.responsible,
        self.due_date,
        self.root_cause,
        self.status,
        self.closure_comment,
        self.evidence_url,
        self.updated_at,
        self.closed_at,
        expected_status,
      ],
    )
  }
}

impl SqliteStore {
  /// Persist `next` over `current`. Returns false if another writer changed
  /// the status in between.
  async fn save_acpm(&self, current: &Acpm, next: &Acpm) -> Result<bool> {
    let row = AcpmRow::new(next);
    let expected = encode_status(current.status);
    let written = self
      .conn
      .call(move |conn| Ok(row.update_if(conn, expected)?))
      .await?;
    Ok(written == 1)
  }

  async fn require_acpm(&self, acpm_id: Uuid) -> Result<Acpm> {
    self
      .get_acpm(acpm_id)
      .await?
      .ok_or_else(|| sgc_core::Error::AcpmNotFound(acpm_id).into())
  }
}

impl AcpmStore for SqliteStore {
  async fn create_acpm(&self, input: NewAcpm) -> Result<Acpm> {
    let acpm = new_acpm(input)?;
    let row = AcpmRow::new(&acpm);
    self.conn.call(move |conn| Ok(row.insert(conn)?)).await?;
    Ok(acpm)
  }

  async fn get_acpm(&self, acpm_id: Uuid) -> Result<Option<Acpm>> {
    let id_str = encode_uuid(acpm_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_acpm(conn, &id_str)?))
      .await?;
    raw.map(RawAcpm::into_acpm).transpose()
  }

  async fn list_acpms<'a>(&'a self, query: &'a AcpmQuery) -> Result<Vec<Acpm>> {
    let status = query.status.map(encode_status);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACPM_COLUMNS} FROM acpms
           WHERE (?1 IS NULL OR status = ?1)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([status], RawAcpm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
      let acpm = raw.into_acpm()?;
      if query.matches(&acpm) {
        out.push(acpm);
      }
    }
    Ok(out)
  }

  async fn update_acpm(&self, acpm_id: Uuid, update: AcpmUpdate) -> Result<Acpm> {
    loop {
      let current = self.require_acpm(acpm_id).await?;
      let next = apply_update(current.clone(), update.clone(), Utc::now())?;
      if self.save_acpm(&current, &next).await? {
        return Ok(next);
      }
    }
  }

  async fn transition_acpm(
    &self,
    acpm_id: Uuid,
    transition: AcpmTransition,
  ) -> Result<Acpm> {
    // A lost race re-reads the record, so a concurrent close is seen as
    // `AcpmClosed` rather than overwritten.
    loop {
      let current = self.require_acpm(acpm_id).await?;
      let next = apply_transition(current.clone(), transition.clone(), Utc::now())?;
      if self.save_acpm(&current, &next).await? {
        return Ok(next);
      }
    }
  }
}
