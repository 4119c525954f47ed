//! [`CertificateStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use sgc_core::{
  certificate::{
    CertificateQuery, CertificateTemplate, GeneratedCertificate,
    NewGeneratedCertificate,
  },
  store::CertificateStore,
  template::TemplateSchema,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    GENERATED_COLUMNS, RawGenerated, RawTemplate, TEMPLATE_COLUMNS, encode_dt,
    encode_uuid,
  },
};

const DEFAULT_SEARCH_LIMIT: usize = 50;

fn template_name(name: &str) -> Result<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(
      sgc_core::Error::Validation("template name must not be empty".into()).into(),
    );
  }
  Ok(name.to_owned())
}

impl CertificateStore for SqliteStore {
  async fn create_template(
    &self,
    name: String,
    schema: TemplateSchema,
  ) -> Result<CertificateTemplate> {
    let now = Utc::now();
    let template = CertificateTemplate {
      template_id: Uuid::new_v4(),
      name: template_name(&name)?,
      schema,
      created_at: now,
      updated_at: now,
    };

    let id_str      = encode_uuid(template.template_id);
    let name        = template.name.clone();
    let schema_json = serde_json::to_string(&template.schema)?;
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO certificate_templates (
             template_id, name, schema_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, name, schema_json, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(template)
  }

  async fn get_template(&self, template_id: Uuid) -> Result<Option<CertificateTemplate>> {
    let id_str = encode_uuid(template_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates
                 WHERE template_id = ?1"
              ),
              [id_str],
              RawTemplate::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTemplate::into_template).transpose()
  }

  async fn list_templates(&self) -> Result<Vec<CertificateTemplate>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates ORDER BY name"
        ))?;
        let rows = stmt
          .query_map([], RawTemplate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTemplate::into_template).collect()
  }

  async fn update_template(
    &self,
    template_id: Uuid,
    name: String,
    schema: TemplateSchema,
  ) -> Result<CertificateTemplate> {
    let name = template_name(&name)?;
    let id_str = encode_uuid(template_id);
    let schema_json = serde_json::to_string(&schema)?;
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE certificate_templates
           SET name = ?2, schema_json = ?3, updated_at = ?4
           WHERE template_id = ?1",
          rusqlite::params![id_str, name, schema_json, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates
                 WHERE template_id = ?1"
              ),
              [&id_str],
              RawTemplate::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(sgc_core::Error::TemplateNotFound(template_id))?
      .into_template()
  }

  async fn delete_template(&self, template_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(template_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM certificate_templates WHERE template_id = ?1",
          [id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(sgc_core::Error::TemplateNotFound(template_id).into());
    }
    Ok(())
  }

  async fn record_generated(
    &self,
    input: NewGeneratedCertificate,
  ) -> Result<GeneratedCertificate> {
    let generated = GeneratedCertificate {
      certificate_id: Uuid::new_v4(),
      template_id:    input.template_id,
      template_name:  input.template_name,
      values:         input.values,
      batch:          input.batch.filter(|b| !b.trim().is_empty()),
      client:         input.client.filter(|c| !c.trim().is_empty()),
      file_id:        input.file_id,
      pdf_url:        input.pdf_url,
      page_count:     input.page_count,
      created_at:     Utc::now(),
    };

    let id_str        = encode_uuid(generated.certificate_id);
    let template_str  = encode_uuid(generated.template_id);
    let template_name = generated.template_name.clone();
    let values_json   = serde_json::to_string(&generated.values)?;
    let batch         = generated.batch.clone();
    let client        = generated.client.clone();
    let file_str      = encode_uuid(generated.file_id);
    let pdf_url       = generated.pdf_url.clone();
    let page_count    = generated.page_count;
    let at_str        = encode_dt(generated.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO generated_certificates ({GENERATED_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
          ),
          rusqlite::params![
            id_str,
            template_str,
            template_name,
            values_json,
            batch,
            client,
            file_str,
            pdf_url,
            page_count,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(generated)
  }

  async fn get_generated(
    &self,
    certificate_id: Uuid,
  ) -> Result<Option<GeneratedCertificate>> {
    let id_str = encode_uuid(certificate_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {GENERATED_COLUMNS} FROM generated_certificates
                 WHERE certificate_id = ?1"
              ),
              [id_str],
              RawGenerated::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawGenerated::into_generated).transpose()
  }

  async fn search_generated<'a>(
    &'a self,
    query: &'a CertificateQuery,
  ) -> Result<Vec<GeneratedCertificate>> {
    let template_str = query.template_id.map(encode_uuid);
    // Matches batch, client or template name, case-insensitively for ASCII.
    let pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| {
        let escaped = t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        format!("%{escaped}%")
      });
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GENERATED_COLUMNS} FROM generated_certificates
           WHERE (?1 IS NULL OR template_id = ?1)
             AND (?2 IS NULL
                  OR batch LIKE ?2 ESCAPE '\\'
                  OR client LIKE ?2 ESCAPE '\\'
                  OR template_name LIKE ?2 ESCAPE '\\')
           ORDER BY created_at DESC
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![template_str, pattern, limit, offset],
            RawGenerated::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGenerated::into_generated).collect()
  }
}
