//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::record::{Price, ProductRecord, ProductStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunOutcome, RunRecord, RunStatus, StoredProduct, UpsertStats};
use crate::HarvestError;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const UPSERT_SQL: &str = "
    INSERT INTO produtos (
        produto_id, sku, nome, preco_texto, preco_valor, imagem, link,
        categoria, status, fonte, data_scraping, criado_em, atualizado_em
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
    ON CONFLICT(link) DO UPDATE SET
        produto_id = excluded.produto_id,
        sku = excluded.sku,
        nome = excluded.nome,
        preco_texto = excluded.preco_texto,
        preco_valor = excluded.preco_valor,
        imagem = excluded.imagem,
        categoria = excluded.categoria,
        status = excluded.status,
        fonte = excluded.fonte,
        data_scraping = excluded.data_scraping,
        atualizado_em = excluded.atualizado_em
";

const PRODUCT_COLUMNS: &str = "id, produto_id, sku, nome, preco_texto, preco_valor, imagem, link,
     categoria, status, fonte, data_scraping, criado_em, atualizado_em";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status,
     total_products, inserted, updated, errors, duration_seconds";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Applies one record; returns whether it was newly inserted
fn apply_record(conn: &Connection, record: &ProductRecord, now: &str) -> StorageResult<bool> {
    if record.name.trim().is_empty() {
        return Err(StorageError::InvalidRecord(format!(
            "missing name for {}",
            record.link
        )));
    }
    if record.link.trim().is_empty() {
        return Err(StorageError::InvalidRecord(format!(
            "missing link for '{}'",
            record.name
        )));
    }

    let scraped_at = normalize_timestamp(&record.scraped_at)?;

    let exists = conn
        .query_row(
            "SELECT 1 FROM produtos WHERE link = ?1",
            params![record.link],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    conn.execute(
        UPSERT_SQL,
        params![
            non_empty(&record.external_id),
            non_empty(&record.sku),
            record.name,
            record.price_display_text,
            record.price_numeric_value.map(|price| price.as_f64()),
            non_empty(&record.image_url),
            record.link,
            non_empty(&record.category),
            record.status.to_db_string(),
            non_empty(&record.source_url),
            scraped_at,
            now,
        ],
    )?;

    Ok(!exists)
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.is_empty())
}

/// Normalizes an extraction timestamp to UTC RFC 3339
///
/// Accepts RFC 3339 and naive ISO-8601 forms (taken as UTC).
pub fn normalize_timestamp(value: &str) -> StorageResult<String> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc).to_rfc3339());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().to_rfc3339());
        }
    }

    Err(StorageError::InvalidTimestamp {
        value: value.to_string(),
        reason: "expected RFC 3339 or ISO-8601 date-time".to_string(),
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<StoredProduct> {
    Ok(StoredProduct {
        id: row.get(0)?,
        external_id: row.get(1)?,
        sku: row.get(2)?,
        name: row.get(3)?,
        price_text: row.get(4)?,
        price_value: row
            .get::<_, Option<f64>>(5)?
            .and_then(|value| Price::try_from(value).ok()),
        image_url: row.get(6)?,
        link: row.get(7)?,
        category: row.get(8)?,
        status: ProductStatus::from_db_string(&row.get::<_, String>(9)?).unwrap_or_default(),
        source_url: row.get(10)?,
        scraped_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        total_products: row.get::<_, i64>(5)? as u64,
        stats: UpsertStats {
            inserted: row.get::<_, i64>(6)? as u64,
            updated: row.get::<_, i64>(7)? as u64,
            errors: row.get::<_, i64>(8)? as u64,
        },
        duration_seconds: row.get(9)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Products =====

    fn upsert_products(&mut self, records: &[ProductRecord]) -> StorageResult<UpsertStats> {
        let now = Utc::now().to_rfc3339();
        let mut stats = UpsertStats::default();
        let mut tx = self.conn.transaction()?;

        for record in records {
            // A rejected record rolls back only its own savepoint
            let savepoint = tx.savepoint()?;
            match apply_record(&savepoint, record, &now) {
                Ok(inserted) => {
                    savepoint.commit()?;
                    if inserted {
                        stats.inserted += 1;
                    } else {
                        stats.updated += 1;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to save '{}' ({}): {}", record.name, record.link, e);
                    stats.errors += 1;
                }
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Upserted batch of {}: {} inserted, {} updated, {} errors",
            records.len(),
            stats.inserted,
            stats.updated,
            stats.errors
        );

        Ok(stats)
    }

    fn get_product_by_link(&self, link: &str) -> StorageResult<Option<StoredProduct>> {
        let sql = format!("SELECT {} FROM produtos WHERE link = ?1", PRODUCT_COLUMNS);
        let product = self
            .conn
            .query_row(&sql, params![link], product_from_row)
            .optional()?;
        Ok(product)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, outcome: &RunOutcome) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, total_products = ?3,
                 inserted = ?4, updated = ?5, errors = ?6, duration_seconds = ?7
             WHERE id = ?8",
            params![
                outcome.status.to_db_string(),
                now,
                outcome.total_products as i64,
                outcome.stats.inserted as i64,
                outcome.stats.updated as i64,
                outcome.stats.errors as i64,
                outcome.duration_seconds,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM produtos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_priced(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM produtos WHERE preco_valor IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(categoria, ''), COUNT(*) FROM produtos
             GROUP BY categoria ORDER BY categoria",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}
