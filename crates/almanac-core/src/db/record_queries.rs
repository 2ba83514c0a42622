//! Cached record storage.

use std::collections::HashSet;

use jiff::Timestamp;
use rusqlite::{OptionalExtension, params};

use crate::{
    error::{DatabaseResultExt, Result},
    models::{ItemType, Planning, Record},
};

const UPSERT_RECORD_SQL: &str = "INSERT INTO records (item_type, id, body, cached_at) VALUES (?1, ?2, ?3, ?4) \
     ON CONFLICT (item_type, id) DO UPDATE SET body = excluded.body, cached_at = excluded.cached_at";
const SELECT_RECORD_SQL: &str = "SELECT body FROM records WHERE item_type = ?1 AND id = ?2";
const SELECT_IDS_SQL: &str = "SELECT id FROM records WHERE item_type = ?1";
const DELETE_RECORD_SQL: &str = "DELETE FROM records WHERE item_type = ?1 AND id = ?2";
const COUNT_RECORDS_SQL: &str = "SELECT COUNT(*) FROM records";

impl super::Database {
    /// Stores or refreshes records. Unsaved records are ignored.
    ///
    /// Returns the number of records written.
    pub fn upsert_records(&mut self, records: &[Record]) -> Result<usize> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now().to_string();
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(UPSERT_RECORD_SQL)
                .db_context("Failed to prepare record upsert")?;
            for record in records {
                let Some(id) = record.id() else {
                    continue;
                };
                let body = serde_json::to_string(record)?;
                stmt.execute(params![record.item_type().as_str(), id, body, &now])
                    .db_context("Failed to upsert record")?;
                written += 1;
            }
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(written)
    }

    /// Retrieves a cached record.
    pub fn get_record(&self, item_type: ItemType, id: &str) -> Result<Option<Record>> {
        let body: Option<String> = self
            .connection
            .query_row(SELECT_RECORD_SQL, params![item_type.as_str(), id], |row| {
                row.get(0)
            })
            .optional()
            .db_context("Failed to query record")?;

        body.map(|body| serde_json::from_str(&body).map_err(Into::into))
            .transpose()
    }

    /// Retrieves a cached planning item.
    pub fn get_planning(&self, id: &str) -> Result<Option<Planning>> {
        Ok(self
            .get_record(ItemType::Planning, id)?
            .and_then(|record| match record {
                Record::Planning(planning) => Some(planning),
                Record::Event(_) => None,
            }))
    }

    /// Returns the IDs from `ids` that have no cached record, in input order.
    pub fn missing_ids(&self, item_type: ItemType, ids: &[String]) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_IDS_SQL)
            .db_context("Failed to prepare query")?;
        let cached: HashSet<String> = stmt
            .query_map(params![item_type.as_str()], |row| row.get(0))
            .db_context("Failed to query cached ids")?
            .collect::<std::result::Result<_, _>>()
            .db_context("Failed to read cached ids")?;

        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| !cached.contains(*id) && seen.insert(id.as_str()))
            .cloned()
            .collect())
    }

    /// Removes a cached record. Returns whether one existed.
    pub fn delete_record(&self, item_type: ItemType, id: &str) -> Result<bool> {
        let deleted = self
            .connection
            .execute(DELETE_RECORD_SQL, params![item_type.as_str(), id])
            .db_context("Failed to delete record")?;
        Ok(deleted > 0)
    }

    pub fn record_count(&self) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row(COUNT_RECORDS_SQL, [], |row| row.get(0))
            .db_context("Failed to count records")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
