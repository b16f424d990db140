//! SQLite opportunity store
//!
//! Schema comes from the embedded migrations in `migrations/`. List fields
//! and metrics are JSON text columns, timestamps are RFC 3339 text with
//! microsecond precision, and creation order is the table's rowid order.
//! Every operation runs in its own transaction. Writes open theirs with
//! `BEGIN IMMEDIATE` so the write lock is held before anything is read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{generate_id, OpportunityStore};
use crate::error::{AnalystError, Result};
use crate::model::{
    self, Metrics, NewOpportunity, Opportunity, OpportunityFilter, OpportunityPatch,
    OpportunityStatus, OpportunityType,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const FILE_POOL_SIZE: u32 = 5;

macro_rules! select_opportunities {
    ($tail:literal) => {
        concat!(
            "SELECT id, title, asset, \"type\" AS kind, confidence, rationale, ",
            "sources, metrics, tags, status, created_at, updated_at, expires_at ",
            "FROM opportunities ",
            $tail
        )
    };
}

/// Opportunities persisted in a SQLite database
#[derive(Clone)]
pub struct SqliteOpportunityStore {
    pool: SqlitePool,
}

impl SqliteOpportunityStore {
    /// Open (creating if needed) the database at `database_url` and apply
    /// migrations. In-memory URLs get a single long-lived connection so the
    /// data survives between calls.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(FILE_POOL_SIZE)
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        info!(url = database_url, "Connected to SQLite");
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying pending migrations
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Write transaction that takes SQLite's write lock on `BEGIN`.
///
/// A deferred transaction that reads first holds a WAL snapshot, and
/// upgrading it to a write fails with `SQLITE_BUSY_SNAPSHOT` once another
/// connection has committed. `BEGIN IMMEDIATE` waits on `busy_timeout`
/// instead. If the transaction is dropped before it finishes, the
/// connection is closed rather than returned to the pool mid-transaction.
struct WriteTx {
    conn: PoolConnection<Sqlite>,
    finished: bool,
}

impl WriteTx {
    async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut tx = Self {
            conn: pool.acquire().await?,
            finished: false,
        };
        sqlx::query("BEGIN IMMEDIATE").execute(tx.conn()).await?;
        Ok(tx)
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Commit on `Ok`, roll back on `Err`. The outcome's own error wins over
    /// a failed rollback.
    async fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        let statement = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        match sqlx::query(statement).execute(self.conn()).await {
            Ok(_) => {
                self.finished = true;
                outcome
            }
            Err(e) => outcome.and(Err(e.into())),
        }
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if !self.finished {
            self.conn.close_on_drop();
        }
    }
}

#[async_trait]
impl OpportunityStore for SqliteOpportunityStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn add(&self, new: NewOpportunity) -> Result<Opportunity> {
        let record = new.into_record(generate_id(), model::now())?;
        let row = RowValues::encode(&record)?;

        let mut tx = WriteTx::begin(&self.pool).await?;
        let outcome = sqlx::query(
            r#"
            INSERT INTO opportunities (
                id, title, asset, "type", confidence, rationale,
                sources, metrics, tags, status, created_at, updated_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.asset)
        .bind(record.kind.as_str())
        .bind(record.confidence)
        .bind(&record.rationale)
        .bind(&row.sources)
        .bind(&row.metrics)
        .bind(&row.tags)
        .bind(record.status.as_str())
        .bind(model::format_timestamp(&record.created_at))
        .bind(model::format_timestamp(&record.updated_at))
        .bind(&row.expires_at)
        .execute(tx.conn())
        .await
        .map_err(AnalystError::from);
        tx.finish(outcome).await?;

        debug!(id = %record.id, asset = %record.asset, "Added opportunity");
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Opportunity> {
        let mut tx = self.pool.begin().await?;
        let row: Option<OpportunityRow> = sqlx::query_as(select_opportunities!("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.ok_or_else(|| AnalystError::NotFound(id.to_string()))?
            .into_record()
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>> {
        let mut tx = self.pool.begin().await?;
        let rows: Vec<OpportunityRow> = match filter.status {
            Some(status) => {
                sqlx::query_as(select_opportunities!("WHERE status = ? ORDER BY rowid"))
                    .bind(status.as_str())
                    .fetch_all(&mut *tx)
                    .await?
            }
            None => {
                sqlx::query_as(select_opportunities!("ORDER BY rowid"))
                    .fetch_all(&mut *tx)
                    .await?
            }
        };
        tx.commit().await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let record = row.into_record()?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn update(&self, id: &str, patch: &OpportunityPatch) -> Result<Opportunity> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let outcome = update_in(tx.conn(), id, patch).await;
        let record = tx.finish(outcome).await?;

        if !patch.is_empty() {
            debug!(id, fields = ?patch.field_names(), "Updated opportunity");
        }
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let outcome = sqlx::query("DELETE FROM opportunities WHERE id = ?")
            .bind(id)
            .execute(tx.conn())
            .await
            .map(|done| done.rows_affected())
            .map_err(AnalystError::from);
        let deleted = tx.finish(outcome).await?;

        if deleted == 0 {
            return Err(AnalystError::NotFound(id.to_string()));
        }
        debug!(id, "Deleted opportunity");
        Ok(())
    }
}

/// Read, patch and write back one record on a connection that already
/// holds the write lock
async fn update_in(
    conn: &mut SqliteConnection,
    id: &str,
    patch: &OpportunityPatch,
) -> Result<Opportunity> {
    let row: Option<OpportunityRow> = sqlx::query_as(select_opportunities!("WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let mut record = row
        .ok_or_else(|| AnalystError::NotFound(id.to_string()))?
        .into_record()?;

    if patch.is_empty() {
        return Ok(record);
    }

    patch.apply_to(&mut record)?;
    record.updated_at = model::next_update_stamp(record.updated_at);
    let row = RowValues::encode(&record)?;

    sqlx::query(
        r#"
        UPDATE opportunities
        SET title = ?, asset = ?, "type" = ?, confidence = ?, rationale = ?,
            sources = ?, metrics = ?, tags = ?, status = ?,
            updated_at = ?, expires_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&record.title)
    .bind(&record.asset)
    .bind(record.kind.as_str())
    .bind(record.confidence)
    .bind(&record.rationale)
    .bind(&row.sources)
    .bind(&row.metrics)
    .bind(&row.tags)
    .bind(record.status.as_str())
    .bind(model::format_timestamp(&record.updated_at))
    .bind(&row.expires_at)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(record)
}

/// Column values that need encoding before binding
struct RowValues {
    sources: String,
    metrics: String,
    tags: String,
    expires_at: Option<String>,
}

impl RowValues {
    fn encode(record: &Opportunity) -> Result<Self> {
        Ok(Self {
            sources: serde_json::to_string(&record.sources)?,
            metrics: serde_json::to_string(&record.metrics)?,
            tags: serde_json::to_string(&record.tags)?,
            expires_at: record.expires_at.as_ref().map(model::format_timestamp),
        })
    }
}

#[derive(FromRow)]
struct OpportunityRow {
    id: String,
    title: String,
    asset: String,
    kind: String,
    confidence: f64,
    rationale: String,
    sources: String,
    metrics: String,
    tags: String,
    status: String,
    created_at: String,
    updated_at: String,
    expires_at: Option<String>,
}

impl OpportunityRow {
    fn into_record(self) -> Result<Opportunity> {
        let id = self.id;
        let corrupt = |reason: String| AnalystError::CorruptRecord {
            id: id.clone(),
            reason,
        };
        let timestamp = |column: &str, raw: &str| -> Result<DateTime<Utc>> {
            DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("{column}: {e}")))
        };

        let kind: OpportunityType = self.kind.parse().map_err(|e| corrupt(format!("type: {e}")))?;
        let status: OpportunityStatus = self.status.parse().map_err(|e| corrupt(format!("status: {e}")))?;
        let sources: Vec<String> =
            serde_json::from_str(&self.sources).map_err(|e| corrupt(format!("sources: {e}")))?;
        let metrics: Metrics =
            serde_json::from_str(&self.metrics).map_err(|e| corrupt(format!("metrics: {e}")))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags).map_err(|e| corrupt(format!("tags: {e}")))?;
        let created_at = timestamp("created_at", &self.created_at)?;
        let updated_at = timestamp("updated_at", &self.updated_at)?;
        let expires_at = self
            .expires_at
            .as_deref()
            .map(|raw| timestamp("expires_at", raw))
            .transpose()?;

        Ok(Opportunity {
            id,
            title: self.title,
            asset: self.asset,
            kind,
            confidence: self.confidence,
            rationale: self.rationale,
            sources,
            metrics,
            created_at,
            updated_at,
            expires_at,
            status,
            tags,
        })
    }
}
