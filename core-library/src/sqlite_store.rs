//! SQLite-backed [`IndexStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use crate::error::{LibraryError, Result};
use crate::models::IndexEntry;
use crate::store::{check_batch_size, BatchOutcome, IndexStore, WriteBatch, WriteOp};

// Every statement in a batch is a write, so the transaction takes the write
// lock on its first statement and waits out `busy_timeout` under contention.
// A read first would pin a WAL snapshot that fails to upgrade once another
// connection commits.
const INSERT_NEW_SQL: &str = r#"
    INSERT INTO library_index (
        id, name, mime_type, parents, web_view_link, thumbnail_link,
        last_synced_at, source, first_indexed_at, annotations
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO NOTHING
"#;

const MERGE_SYNC_FIELDS_SQL: &str = r#"
    UPDATE library_index SET
        name = ?,
        mime_type = ?,
        parents = ?,
        web_view_link = ?,
        thumbnail_link = ?,
        last_synced_at = ?,
        source = ?
    WHERE id = ?
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, mime_type, parents, web_view_link, thumbnail_link, \
     last_synced_at, source, first_indexed_at, annotations FROM library_index";

/// Index store over the `library_index` table.
///
/// Each [`WriteBatch`] runs in its own transaction.
pub struct SqliteIndexStore {
    pool: SqlitePool,
    max_batch_size: usize,
}

impl SqliteIndexStore {
    pub fn new(pool: SqlitePool, max_batch_size: usize) -> Self {
        Self {
            pool,
            max_batch_size,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn encode_json<T: serde::Serialize>(id: &str, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(|e| LibraryError::CorruptRow {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    fn decode_timestamp(id: &str, millis: i64) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis).ok_or_else(|| LibraryError::CorruptRow {
            id: id.to_string(),
            message: format!("timestamp out of range: {}", millis),
        })
    }

    fn decode_row(row: &SqliteRow) -> Result<IndexEntry> {
        let id: String = row.try_get("id")?;

        let parents: BTreeSet<String> =
            serde_json::from_str(&row.try_get::<String, _>("parents")?).map_err(|e| {
                LibraryError::CorruptRow {
                    id: id.clone(),
                    message: format!("parents: {}", e),
                }
            })?;
        let annotations: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&row.try_get::<String, _>("annotations")?).map_err(|e| {
                LibraryError::CorruptRow {
                    id: id.clone(),
                    message: format!("annotations: {}", e),
                }
            })?;

        Ok(IndexEntry {
            name: row.try_get("name")?,
            mime_type: row.try_get("mime_type")?,
            parents,
            web_view_link: row.try_get("web_view_link")?,
            thumbnail_link: row.try_get("thumbnail_link")?,
            last_synced_at: Self::decode_timestamp(&id, row.try_get("last_synced_at")?)?,
            source: row.try_get("source")?,
            first_indexed_at: Self::decode_timestamp(&id, row.try_get("first_indexed_at")?)?,
            annotations,
            id,
        })
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<BatchOutcome> {
        check_batch_size(&batch, self.max_batch_size)?;

        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();

        for op in batch.into_ops() {
            match op {
                WriteOp::Upsert(entry) => {
                    let parents = Self::encode_json(&entry.id, &entry.parents)?;

                    let inserted = sqlx::query(INSERT_NEW_SQL)
                        .bind(&entry.id)
                        .bind(&entry.name)
                        .bind(&entry.mime_type)
                        .bind(&parents)
                        .bind(&entry.web_view_link)
                        .bind(&entry.thumbnail_link)
                        .bind(entry.last_synced_at.timestamp_millis())
                        .bind(&entry.source)
                        .bind(entry.first_indexed_at.timestamp_millis())
                        .bind(Self::encode_json(&entry.id, &entry.annotations)?)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected()
                        > 0;

                    if inserted {
                        outcome.inserted += 1;
                        continue;
                    }

                    sqlx::query(MERGE_SYNC_FIELDS_SQL)
                        .bind(&entry.name)
                        .bind(&entry.mime_type)
                        .bind(&parents)
                        .bind(&entry.web_view_link)
                        .bind(&entry.thumbnail_link)
                        .bind(entry.last_synced_at.timestamp_millis())
                        .bind(&entry.source)
                        .bind(&entry.id)
                        .execute(&mut *tx)
                        .await?;
                    outcome.updated += 1;
                }
                WriteOp::Delete(id) => {
                    let result = sqlx::query("DELETE FROM library_index WHERE id = ?")
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?;
                    outcome.deleted += result.rows_affected() as usize;
                }
            }
        }

        tx.commit().await?;

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            deleted = outcome.deleted,
            "Committed index batch"
        );
        Ok(outcome)
    }

    async fn load_all(&self) -> Result<Vec<IndexEntry>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::decode_row).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM library_index")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
