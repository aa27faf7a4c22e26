//! Axum REST API over the indexed round events.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;
use crate::positions::{self, InvestorPosition, RoundSummary};

const DEFAULT_PAGE: u32 = 100;
const MAX_PAGE: u32 = 500;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_events))
        .route("/investors/:address/events", get(get_investor_events))
        .route("/investors/:address/position", get(get_investor_position))
        .route("/round", get(get_round))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct InvestorEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

/// `?after=<id>&limit=<n>` on `/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub after: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct EventsPageResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
    /// Pass as `after` for the next page; absent once the listing is exhausted.
    pub next_after: Option<i64>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(e: IndexerError) -> Response {
    error!("API query failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Stored events in storage order, at most `limit` (capped at 500) per page.
pub async fn get_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    match db::get_events_page(&state.pool, query.after.unwrap_or(0), limit).await {
        Ok(events) => {
            let next_after = match events.last() {
                Some(last) if events.len() == limit as usize => Some(last.id),
                _ => None,
            };
            Json(EventsPageResponse {
                count: events.len(),
                events,
                next_after,
            })
            .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /investors/:address/events`
///
/// Deposits, cancellations and claims of one investor. An address with no
/// history gets an empty list.
pub async fn get_investor_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::get_events_for_actor(&state.pool, &address).await {
        Ok(events) => Json(InvestorEventsResponse {
            address,
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /investors/:address/position`
///
/// `404` when the address never invested.
pub async fn get_investor_position(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    let events = match db::get_events_for_actor(&state.pool, &address).await {
        Ok(events) => events,
        Err(e) => return internal_error(e),
    };
    match positions::investor_position(&address, &events) {
        Some(position) => Json::<InvestorPosition>(position).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no investments recorded for {address}"),
            }),
        )
            .into_response(),
    }
}

/// `GET /round`
///
/// Served from the summary row that `db::insert_events` keeps current.
pub async fn get_round(State(state): State<Arc<ApiState>>) -> Response {
    match db::load_summary(&state.pool).await {
        Ok(summary) => Json::<RoundSummary>(summary).into_response(),
        Err(e) => internal_error(e),
    }
}
