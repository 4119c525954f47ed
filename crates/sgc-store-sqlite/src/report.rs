//! [`ReportStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use sgc_core::{
  acpm::{Acpm, AcpmSource, NewAcpm, SourceKind},
  report::{NewReport, Report},
  store::ReportStore,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  acpm::{AcpmRow, new_acpm},
  encode::{REPORT_COLUMNS, RawReport, decode_uuid, encode_dt, encode_uuid},
};

fn select_report(conn: &Connection, id: &str) -> rusqlite::Result<Option<RawReport>> {
  conn
    .query_row(
      &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?1"),
      [id],
      RawReport::from_row,
    )
    .optional()
}

enum Escalation {
  Missing,
  Linked(String),
  Done(RawReport),
}

impl ReportStore for SqliteStore {
  async fn create_report(&self, input: NewReport) -> Result<Report> {
    input.validate()?;
    let report = Report {
      report_id:    Uuid::new_v4(),
      passed:       input.resolved_passed(),
      category:     input.category.trim().to_owned(),
      title:        input.title,
      answers:      input.answers,
      evidence_url: input.evidence_url,
      verified:     false,
      acpm_id:      None,
      created_by:   input.created_by,
      created_at:   Utc::now(),
    };

    let id_str       = encode_uuid(report.report_id);
    let category     = report.category.clone();
    let title        = report.title.clone();
    let answers      = serde_json::to_string(&report.answers)?;
    let passed       = report.passed;
    let evidence_url = report.evidence_url.clone();
    let created_by   = report.created_by.clone();
    let at_str       = encode_dt(report.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (
             report_id, category, title, answers, passed, evidence_url,
             verified, acpm_id, created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7, ?8)",
          rusqlite::params![
            id_str,
            category,
            title,
            answers,
            passed,
            evidence_url,
            created_by,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(report)
  }

  async fn get_report(&self, report_id: Uuid) -> Result<Option<Report>> {
    let id_str = encode_uuid(report_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_report(conn, &id_str)?))
      .await?;
    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, category: Option<String>) -> Result<Vec<Report>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS} FROM reports
           WHERE (?1 IS NULL OR category = ?1)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([category], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn verify_report(&self, report_id: Uuid) -> Result<Report> {
    let id_str = encode_uuid(report_id);
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute("UPDATE reports SET verified = 1 WHERE report_id = ?1", [&id_str])?;
        Ok(select_report(conn, &id_str)?)
      })
      .await?;

    raw
      .ok_or_else(|| sgc_core::Error::ReportNotFound(report_id))?
      .into_report()
  }

  async fn delete_report(&self, report_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(report_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM reports WHERE report_id = ?1", [id_str])?)
      })
      .await?;

    if deleted == 0 {
      return Err(sgc_core::Error::ReportNotFound(report_id).into());
    }
    Ok(())
  }

  async fn escalate_report(
    &self,
    report_id: Uuid,
    mut input: NewAcpm,
  ) -> Result<(Report, Acpm)> {
    input.source = Some(AcpmSource {
      kind:         SourceKind::Report,
      reference_id: Some(report_id),
    });
    if input.origin.trim().is_empty() {
      input.origin = "Reporte".to_owned();
    }
    let acpm = new_acpm(input)?;
    let row = AcpmRow::new(&acpm);
    let report_str = encode_uuid(report_id);
    let acpm_str = encode_uuid(acpm.acpm_id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(report) = select_report(&tx, &report_str)? else {
          return Ok(Escalation::Missing);
        };
        if let Some(existing) = report.acpm_id {
          return Ok(Escalation::Linked(existing));
        }
        row.insert(&tx)?;
        tx.execute(
          "UPDATE reports SET acpm_id = ?2 WHERE report_id = ?1",
          rusqlite::params![report_str, acpm_str],
        )?;
        let linked = RawReport { acpm_id: Some(acpm_str), ..report };
        tx.commit()?;
        Ok(Escalation::Done(linked))
      })
      .await?;

    match outcome {
      Escalation::Done(report) => Ok((report.into_report()?, acpm)),
      Escalation::Missing => Err(sgc_core::Error::ReportNotFound(report_id).into()),
      Escalation::Linked(existing) => Err(
        sgc_core::Error::AlreadyEscalated {
          report: report_id,
          acpm:   decode_uuid(&existing)?,
        }
        .into(),
      ),
    }
  }
}
