//! SQLite persistence: migrations, the poll cursor, and event rows.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::info;

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, EventRecord, RoundEvent};
use crate::positions::RoundSummary;

const EVENT_COLUMNS: &str = "id, event_id, event_type, actor, amount, issued, detail, ledger, \
                             timestamp, contract_id, tx_hash, created_at";

/// Open (creating if needed) the database and apply pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// In-memory database for tests. One connection, since every new
/// `:memory:` connection is a separate database.
#[cfg(test)]
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor
// ─────────────────────────────────────────────────────────

/// Last ledger the poller reached; `0` before the first save.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Pagination cursor saved with the last page, used to resume mid-range.
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Store a batch of events in one transaction and fold the new ones into
/// the stored [`RoundSummary`]. Rows whose `event_id` is already present
/// are skipped, so replaying a page changes nothing.
///
/// Returns the number of rows actually inserted.
pub async fn insert_events(pool: &SqlitePool, events: &[RoundEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut summary = read_summary(&mut *tx).await?;
    let mut count = 0usize;
    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, actor, amount, issued, detail,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.issued)
        .bind(&ev.detail)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            continue;
        }
        count += 1;

        if let (EventKind::InvestmentAdded, Some(actor)) = (ev.kind(), &ev.actor) {
            let first_deposit = sqlx::query("INSERT OR IGNORE INTO investors (address) VALUES (?1)")
                .bind(actor)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            summary.investors += first_deposit as usize;
        }
        summary.apply(ev);
    }
    write_summary(&mut *tx, &summary).await?;
    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Round summary
// ─────────────────────────────────────────────────────────

type SummaryRow = (Option<String>, String, String, String, i64, i64);

fn parse_total(column: &str, raw: &str) -> Result<i128> {
    raw.parse()
        .map_err(|_| IndexerError::Decode(format!("round_summary.{column} is not an integer: {raw:?}")))
}

async fn read_summary<'c, E>(executor: E) -> Result<RoundSummary>
where
    E: Executor<'c, Database = Sqlite>,
{
    let (status, total_raised, outstanding, withdrawn, investors, last_ledger): SummaryRow =
        sqlx::query_as(
            "SELECT status, total_raised, outstanding, withdrawn, investors, last_ledger \
             FROM round_summary WHERE id = 1",
        )
        .fetch_one(executor)
        .await?;

    Ok(RoundSummary {
        status,
        total_raised: parse_total("total_raised", &total_raised)?,
        outstanding: parse_total("outstanding", &outstanding)?,
        withdrawn: parse_total("withdrawn", &withdrawn)?,
        investors: investors.max(0) as usize,
        last_ledger,
    })
}

async fn write_summary<'c, E>(executor: E, summary: &RoundSummary) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE round_summary
        SET    status = ?1, total_raised = ?2, outstanding = ?3, withdrawn = ?4,
               investors = ?5, last_ledger = ?6
        WHERE  id = 1
        "#,
    )
    .bind(&summary.status)
    .bind(summary.total_raised.to_string())
    .bind(summary.outstanding.to_string())
    .bind(summary.withdrawn.to_string())
    .bind(summary.investors as i64)
    .bind(summary.last_ledger)
    .execute(executor)
    .await?;
    Ok(())
}

/// The summary as of the last stored event. Costs one row read.
pub async fn load_summary(pool: &SqlitePool) -> Result<RoundSummary> {
    read_summary(pool).await
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

/// Every event whose actor is `address`, oldest first.
pub async fn get_events_for_actor(pool: &SqlitePool, address: &str) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE actor = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(address)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Up to `limit` events stored after row `after`, in storage order.
/// Pass the last returned `id` as `after` to fetch the next page.
pub async fn get_events_page(pool: &SqlitePool, after: i64, limit: u32) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id > ?1 ORDER BY id ASC LIMIT ?2");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(after)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
