//! Background poller: pulls round events from the RPC into the database
//! until the shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll forever; returns once `shutdown` is cancelled. An in-flight poll
/// (including its RPC back-off) is abandoned at that point; the cursor
/// saved by the previous poll stays valid.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "indexer starting");

    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let mut cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);
    let mut current_ledger = resume_ledger(last_ledger, state.config.start_ledger);

    info!("Resuming from ledger {current_ledger}");

    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(
                &state.pool,
                &state.client,
                &state.config,
                current_ledger,
                cursor.as_deref(),
            ) => polled,
        };

        match polled {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }

    info!(ledger = current_ledger, "indexer stopped");
}

fn resume_ledger(saved: i64, configured: u32) -> u32 {
    match u32::try_from(saved) {
        Ok(ledger) if ledger > 0 => ledger,
        _ => configured,
    }
}

/// Never move the start ledger backwards, even if the RPC reports an
/// older latest ledger after a node switch.
fn advance_ledger(start: u32, latest: Option<u64>) -> u32 {
    latest
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX).max(start))
        .unwrap_or(start)
}

/// One poll: fetch a page, store it, persist the cursor.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    start_ledger: u32,
    cursor: Option<&str>,
) -> Result<(u32, Option<String>)> {
    let page = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(pool, &decoded).await?;
        info!(
            raw = page.events.len(),
            stored = inserted,
            "polled round events"
        );
    }

    let next_ledger = advance_ledger(start_ledger, page.latest_ledger);
    // A cursor, when present, takes precedence over the start ledger on the
    // next request, so pagination continues inside the same range.
    db::save_cursor(pool, next_ledger as i64, page.cursor.as_deref()).await?;

    Ok((next_ledger, page.cursor))
}
