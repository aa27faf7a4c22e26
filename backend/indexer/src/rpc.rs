//! Soroban RPC client: pages through `getEvents` and decodes round events.
//!
//! ## Resilience
//!
//! * Transport failures, HTTP 429 and soft JSON-RPC errors are retried with
//!   exponential back-off starting at [`INITIAL_BACKOFF_SECS`] and capped at
//!   [`MAX_BACKOFF_SECS`].
//! * `-32600` (invalid request) and `-32601` (method not found) are returned
//!   as [`IndexerError::Rpc`]; retrying them cannot succeed.
//!
//! ## Value formats
//!
//! Topics may arrive as base64 XDR `ScVal`s or as JSON. Event data is read
//! from its JSON rendering, either a flat object keyed by field name or a
//! `{"map": [{"key": .., "val": ..}]}` list.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, RoundEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// `ScValType::Symbol` discriminant in the XDR union.
const SCV_SYMBOL: u32 = 15;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawEvent {
    pub topic: Vec<String>,
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Fetching
// ─────────────────────────────────────────────────────────

/// Fetch one page of contract events.
///
/// * `start_ledger` is only sent when there is no `cursor`.
/// * `limit` caps the number of events returned.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                backoff = pause(backoff).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            backoff = pause(backoff).await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if is_hard_error(err.code) {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            warn!(
                "RPC soft error (will retry in {backoff}s): {} {}",
                err.code, err.message
            );
            backoff = pause(backoff).await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::Decode("Empty result from getEvents".to_string()))?;

        debug!(
            events = result.events.len(),
            latest_ledger = ?result.latest_ledger,
            "fetched events page"
        );

        return Ok(EventsPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

async fn pause(backoff: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(backoff)).await;
    next_backoff(backoff)
}

fn next_backoff(current: u64) -> u64 {
    current.saturating_mul(2).min(MAX_BACKOFF_SECS)
}

fn is_hard_error(code: i64) -> bool {
    code == -32600 || code == -32601
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode raw RPC events into [`RoundEvent`]s.
///
/// Events from failed invocations and events without an id are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<RoundEvent> {
    raw.iter()
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<RoundEvent> {
    if raw.in_successful_contract_call == Some(false) {
        return None;
    }
    let Some(event_id) = raw.id.clone().or_else(|| raw.paging_token.clone()) else {
        warn!(ledger = ?raw.ledger, "skipping event without id");
        return None;
    };

    let kind = EventKind::from_topic(&topic_symbol(raw.topic.first()?)?);

    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let fields = decode_data(&struct_fields(&raw.value), &raw.value, &raw.topic, kind);

    Some(RoundEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        actor: fields.actor,
        amount: fields.amount,
        issued: fields.issued,
        detail: fields.detail,
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.as_deref().and_then(normalize_tx_hash),
    })
}

#[derive(Debug, Default)]
struct Fields {
    actor: Option<String>,
    amount: Option<String>,
    issued: Option<String>,
    detail: Option<String>,
}

fn decode_data(
    fields: &Map<String, Value>,
    value: &Value,
    topic: &[String],
    kind: EventKind,
) -> Fields {
    let text = |key: &str| fields.get(key).and_then(scalar);
    let amount = |key: &str| fields.get(key).and_then(scalar).and_then(|s| integer(&s));

    match kind {
        EventKind::InvestmentAdded | EventKind::InvestmentCancelled => Fields {
            actor: text("investor"),
            amount: amount("amount"),
            ..Fields::default()
        },
        EventKind::TokensClaimed => Fields {
            actor: text("investor"),
            amount: amount("invested"),
            issued: amount("issued"),
            ..Fields::default()
        },
        EventKind::StatusChanged => Fields {
            detail: match (text("from"), text("to")) {
                (Some(from), Some(to)) => Some(format!("{from}->{to}")),
                _ => None,
            },
            ..Fields::default()
        },
        EventKind::FundsWithdrawn => Fields {
            actor: text("destination"),
            amount: amount("amount"),
            ..Fields::default()
        },
        EventKind::ConfigUpdated => Fields {
            amount: scalar(value).and_then(|s| integer(&s)),
            detail: topic.get(1).and_then(|t| topic_symbol(t)),
            ..Fields::default()
        },
        EventKind::AdminTransferred => Fields {
            actor: text("admin"),
            detail: text("previous"),
            ..Fields::default()
        },
        EventKind::Unknown => Fields::default(),
    }
}

/// Field map of a contract struct, whichever JSON shape the RPC used.
fn struct_fields(value: &Value) -> Map<String, Value> {
    if let Some(entries) = value.get("map").and_then(Value::as_array) {
        return entries
            .iter()
            .filter_map(|entry| {
                let key = scalar(entry.get("key")?)?;
                Some((key, entry.get("val")?.clone()))
            })
            .collect();
    }
    value.as_object().cloned().unwrap_or_default()
}

/// Collapse a JSON-rendered `ScVal` to its textual payload.
///
/// Handles plain strings and numbers, tagged objects such as
/// `{"i128": "5"}` or `{"type": "symbol", "value": "Live"}`, `{hi, lo}`
/// 128-bit pairs and enum variants rendered as a one-element vector.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(scalar),
        Value::Object(map) => {
            if let (Some(hi), Some(lo)) = (
                map.get("hi").and_then(Value::as_i64),
                map.get("lo").and_then(Value::as_u64),
            ) {
                return Some((((hi as i128) << 64) | lo as i128).to_string());
            }
            if let Some(inner) = map.get("value") {
                return scalar(inner);
            }
            if map.len() == 1 {
                return map.values().next().and_then(scalar);
            }
            None
        }
        _ => None,
    }
}

fn integer(s: &str) -> Option<String> {
    match s.trim().parse::<i128>() {
        Ok(n) => Some(n.to_string()),
        Err(_) => {
            warn!("ignoring non-integer amount {s:?}");
            None
        }
    }
}

/// Read a topic entry as a symbol.
///
/// Accepts JSON (`{"type":"symbol","value":"invested"}`, `{"symbol":"invested"}`),
/// a base64 XDR `ScVal::Symbol`, or falls back to the raw string.
fn topic_symbol(raw: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if v.is_object() {
            return scalar(&v);
        }
    }
    if let Some(symbol) = xdr_symbol(raw) {
        return Some(symbol);
    }
    Some(raw.to_string())
}

fn xdr_symbol(raw: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(raw).ok()?;
    let word = |at: usize| -> Option<u32> {
        let chunk: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
        Some(u32::from_be_bytes(chunk))
    };
    if word(0)? != SCV_SYMBOL {
        return None;
    }
    let len = word(4)? as usize;
    let body = bytes.get(8..8 + len)?;
    let symbol = std::str::from_utf8(body).ok()?;
    symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        .then(|| symbol.to_string())
}

/// Lower-case a 32-byte transaction hash; anything else is dropped.
fn normalize_tx_hash(raw: &str) -> Option<String> {
    match hex::decode(raw) {
        Ok(bytes) if bytes.len() == 32 => Some(hex::encode(bytes)),
        _ => {
            warn!("ignoring malformed tx hash {raw:?}");
            None
        }
    }
}

fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
