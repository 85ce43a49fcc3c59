//! [`SqliteStore`]: the SQLite implementation of [`IncidentStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, types::Value};

use tally_core::{
  catalog::{CatalogEntry, CatalogKind, SeedEntry, normalize_name},
  incident::{IncidentRecord, NewIncident},
  report::{DataRow, ReportFilter},
  store::IncidentStore,
};

use crate::{
  Result,
  encode::{
    DATA_ROW_SELECT, RawDataRow, catalog_table, encode_date, encode_dt, incident_fk,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally incident store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What a catalog write found, decided on the connection thread.
enum CatalogWrite {
  Done(i64),
  Missing,
  Duplicate,
  Referenced(u64),
}

/// Outcome of an incident insert.
enum Submission {
  Inserted(i64),
  Unknown(CatalogKind, i64),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_rows(
    &self,
    sql: String,
    params: Vec<Value>,
  ) -> Result<Vec<DataRow>> {
    let raws: Vec<RawDataRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawDataRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDataRow::into_row).collect()
  }
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = crate::Error;

  // ── Catalogs ──────────────────────────────────────────────────────────────

  async fn list_catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>> {
    let table = catalog_table(kind);

    let entries = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT id, name FROM {table} ORDER BY name, id"))?;
        let rows = stmt
          .query_map([], |row| {
            Ok(CatalogEntry {
              id:   row.get(0)?,
              name: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(entries)
  }

  async fn get_catalog_entry(
    &self,
    kind: CatalogKind,
    id: i64,
  ) -> Result<Option<CatalogEntry>> {
    let table = catalog_table(kind);

    let entry = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT id, name FROM {table} WHERE id = ?1"),
              rusqlite::params![id],
              |row| {
                Ok(CatalogEntry {
                  id:   row.get(0)?,
                  name: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(entry)
  }

  async fn add_catalog_entry(
    &self,
    kind: CatalogKind,
    name: String,
  ) -> Result<CatalogEntry> {
    let name  = normalize_name(&name)?;
    let table = catalog_table(kind);
    let value = name.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE name = ?1"),
            rusqlite::params![value],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(CatalogWrite::Duplicate);
        }
        conn.execute(
          &format!("INSERT INTO {table} (name) VALUES (?1)"),
          rusqlite::params![value],
        )?;
        Ok(CatalogWrite::Done(conn.last_insert_rowid()))
      })
      .await?;

    match outcome {
      CatalogWrite::Done(id) => {
        tracing::info!(%kind, id, %name, "catalog entry added");
        Ok(CatalogEntry { id, name })
      }
      _ => Err(tally_core::Error::DuplicateName { kind, name }.into()),
    }
  }

  async fn rename_catalog_entry(
    &self,
    kind: CatalogKind,
    id: i64,
    name: String,
  ) -> Result<CatalogEntry> {
    let name  = normalize_name(&name)?;
    let table = catalog_table(kind);
    let value = name.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            rusqlite::params![id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(CatalogWrite::Missing);
        }
        let clash = tx
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE name = ?1 AND id != ?2"),
            rusqlite::params![value, id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if clash {
          return Ok(CatalogWrite::Duplicate);
        }
        tx.execute(
          &format!("UPDATE {table} SET name = ?1 WHERE id = ?2"),
          rusqlite::params![value, id],
        )?;
        tx.commit()?;
        Ok(CatalogWrite::Done(id))
      })
      .await?;

    match outcome {
      CatalogWrite::Done(id) => {
        tracing::info!(%kind, id, %name, "catalog entry renamed");
        Ok(CatalogEntry { id, name })
      }
      CatalogWrite::Missing => Err(tally_core::Error::NotFound { kind, id }.into()),
      _ => Err(tally_core::Error::DuplicateName { kind, name }.into()),
    }
  }

  async fn remove_catalog_entry(&self, kind: CatalogKind, id: i64) -> Result<()> {
    let table = catalog_table(kind);
    let fk    = incident_fk(kind);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            rusqlite::params![id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(CatalogWrite::Missing);
        }
        let references: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM incidents WHERE {fk} = ?1"),
          rusqlite::params![id],
          |row| row.get(0),
        )?;
        if references > 0 {
          return Ok(CatalogWrite::Referenced(references as u64));
        }
        tx.execute(
          &format!("DELETE FROM {table} WHERE id = ?1"),
          rusqlite::params![id],
        )?;
        tx.commit()?;
        Ok(CatalogWrite::Done(id))
      })
      .await?;

    match outcome {
      CatalogWrite::Done(_) => {
        tracing::info!(%kind, id, "catalog entry removed");
        Ok(())
      }
      CatalogWrite::Referenced(incidents) => {
        Err(tally_core::Error::Referenced { kind, id, incidents }.into())
      }
      _ => Err(tally_core::Error::NotFound { kind, id }.into()),
    }
  }

  async fn seed_catalog(&self, kind: CatalogKind, entries: Vec<SeedEntry>) -> Result<usize> {
    let table = catalog_table(kind);
    let mut rows: Vec<(Option<i64>, String)> = entries
      .iter()
      .filter_map(|e| normalize_name(e.name()).ok().map(|name| (e.id(), name)))
      .collect();
    // Pinned ids go in before autoincrement can hand them to bare names.
    rows.sort_by_key(|(id, _)| id.is_none());

    let (inserted, skipped) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: i64 =
          tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        if existing > 0 {
          return Ok((0, Vec::new()));
        }
        let mut inserted = 0;
        let mut skipped = Vec::new();
        {
          let mut stmt =
            tx.prepare(&format!("INSERT OR IGNORE INTO {table} (id, name) VALUES (?1, ?2)"))?;
          for (id, name) in rows {
            let changed = stmt.execute(rusqlite::params![id, name])?;
            if changed == 0 {
              skipped.push((id, name));
            }
            inserted += changed;
          }
        }
        tx.commit()?;
        Ok((inserted, skipped))
      })
      .await?;

    for (id, name) in &skipped {
      tracing::warn!(%kind, ?id, %name, "seed entry skipped: id or name already taken");
    }

    if inserted > 0 {
      tracing::info!(%kind, inserted, "catalog seeded");
    }
    Ok(inserted)
  }

  // ── Incidents ─────────────────────────────────────────────────────────────

  async fn submit_incident(&self, input: NewIncident) -> Result<IncidentRecord> {
    let created_at     = Utc::now();
    let occurred_on    = encode_date(input.occurred_on);
    let created_at_str = encode_dt(created_at);
    let plant_id       = input.plant_id;
    let type_id        = input.type_id;
    let description    = input.description.clone();
    let reporter       = input.reporter.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (kind, id) in [
          (CatalogKind::Plant, plant_id),
          (CatalogKind::IncidentType, type_id),
        ] {
          let found = tx
            .query_row(
              &format!("SELECT 1 FROM {} WHERE id = ?1", catalog_table(kind)),
              rusqlite::params![id],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !found {
            return Ok(Submission::Unknown(kind, id));
          }
        }
        tx.execute(
          "INSERT INTO incidents (
             occurred_on, plant_id, type_id, description, reporter, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            occurred_on,
            plant_id,
            type_id,
            description,
            reporter,
            created_at_str,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Submission::Inserted(id))
      })
      .await?;

    match outcome {
      Submission::Inserted(id) => {
        tracing::info!(id, plant_id, type_id, "incident submitted");
        Ok(IncidentRecord {
          id,
          occurred_on: input.occurred_on,
          plant_id,
          type_id,
          description: input.description,
          reporter: input.reporter,
          created_at,
        })
      }
      Submission::Unknown(kind, id) => {
        Err(tally_core::Error::UnknownCatalogEntry { kind, id }.into())
      }
    }
  }

  async fn recent_incidents(&self, limit: usize) -> Result<Vec<DataRow>> {
    let sql = format!("{DATA_ROW_SELECT}\n  ORDER BY i.id DESC\n  LIMIT ?1");
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self.query_rows(sql, vec![Value::Integer(limit)]).await
  }

  // ── Consolidation ─────────────────────────────────────────────────────────

  async fn report_rows(&self, filter: &ReportFilter) -> Result<Vec<DataRow>> {
    // Every criterion is bound; a NULL parameter disables its clause.
    let sql = format!(
      "{DATA_ROW_SELECT}
  WHERE (?1 IS NULL OR i.occurred_on >= ?1)
    AND (?2 IS NULL OR i.occurred_on <= ?2)
    AND (?3 IS NULL OR i.plant_id = ?3)
    AND (?4 IS NULL OR i.type_id  = ?4)
  ORDER BY i.occurred_on ASC, i.id ASC"
    );
    let text = |d: Option<NaiveDate>| d.map_or(Value::Null, |d| Value::Text(encode_date(d)));
    let int  = |id: Option<i64>| id.map_or(Value::Null, Value::Integer);
    let params = vec![
      text(filter.from),
      text(filter.to),
      int(filter.plant_id),
      int(filter.type_id),
    ];
    self.query_rows(sql, params).await
  }
}
