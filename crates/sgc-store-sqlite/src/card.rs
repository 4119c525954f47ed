//! [`CardStore`] for [`SqliteStore`].

use chrono::Utc;
use sgc_core::{
  card::{DocumentCard, NewCard, normalize_module},
  drive::normalize_name,
  store::CardStore,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{CARD_COLUMNS, RawCard, encode_dt, encode_uuid},
};

impl CardStore for SqliteStore {
  async fn list_cards(&self, module: String) -> Result<Vec<DocumentCard>> {
    let module = normalize_module(&module)?;
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CARD_COLUMNS} FROM document_cards
           WHERE module = ?1 ORDER BY position, title"
        ))?;
        let rows = stmt
          .query_map([module], RawCard::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCard::into_card).collect()
  }

  async fn create_card(&self, module: String, input: NewCard) -> Result<DocumentCard> {
    let module = normalize_module(&module)?;
    let title = input.title.trim().to_owned();
    if title.is_empty() {
      return Err(
        sgc_core::Error::Validation("card title must not be empty".into()).into(),
      );
    }
    let folder_name = normalize_name(input.folder_name.as_deref().unwrap_or(&title))?;

    let mut card = DocumentCard {
      card_id: Uuid::new_v4(),
      module,
      title,
      description: input.description,
      folder_name,
      position: input.position.unwrap_or_default(),
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(card.card_id);
    let module      = card.module.clone();
    let title       = card.title.clone();
    let description = card.description.clone();
    let folder_name = card.folder_name.clone();
    let position    = input.position;
    let at_str      = encode_dt(card.created_at);

    // Without an explicit position the card goes after the module's last.
    card.position = self
      .conn
      .call(move |conn| {
        let position = match position {
          Some(p) => p,
          None => conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM document_cards
             WHERE module = ?1",
            [&module],
            |row| row.get(0),
          )?,
        };
        conn.execute(
          &format!(
            "INSERT INTO document_cards ({CARD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![
            id_str,
            module,
            title,
            description,
            folder_name,
            position,
            at_str,
          ],
        )?;
        Ok(position)
      })
      .await?;

    Ok(card)
  }

  async fn delete_card(&self, module: String, card_id: Uuid) -> Result<()> {
    let module = normalize_module(&module)?;
    let id_str = encode_uuid(card_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM document_cards WHERE card_id = ?1 AND module = ?2",
          [id_str, module],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(sgc_core::Error::CardNotFound(card_id).into());
    }
    Ok(())
  }
}
