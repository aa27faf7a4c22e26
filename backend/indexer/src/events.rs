//! Event kinds published by the issuance round contract and their stored form.
//!
//! Topics mirror `contracts/issuance_round/src/events.rs`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An investor deposited currency (`invested` topic).
    InvestmentAdded,
    /// An investor took their whole deposit back (`cancelled` topic).
    InvestmentCancelled,
    /// An investor converted their deposit into issued tokens (`claimed` topic).
    TokensClaimed,
    /// The round moved to a new lifecycle state (`status` topic).
    StatusChanged,
    /// Raised currency was swept to the issuer (`withdrawn` topic).
    FundsWithdrawn,
    /// A round parameter was set (`config` topic).
    ConfigUpdated,
    /// The administrator role changed hands (`admin_set` topic).
    AdminTransferred,
    Unknown,
}

impl EventKind {
    /// Map the leading topic symbol to an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "invested" => Self::InvestmentAdded,
            "cancelled" => Self::InvestmentCancelled,
            "claimed" => Self::TokensClaimed,
            "status" => Self::StatusChanged,
            "withdrawn" => Self::FundsWithdrawn,
            "config" => Self::ConfigUpdated,
            "admin_set" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }

    /// Identifier stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvestmentAdded => "investment_added",
            Self::InvestmentCancelled => "investment_cancelled",
            Self::TokensClaimed => "tokens_claimed",
            Self::StatusChanged => "status_changed",
            Self::FundsWithdrawn => "funds_withdrawn",
            Self::ConfigUpdated => "config_updated",
            Self::AdminTransferred => "admin_transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`]; unrecognised strings map to `Unknown`.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "investment_added" => Self::InvestmentAdded,
            "investment_cancelled" => Self::InvestmentCancelled,
            "tokens_claimed" => Self::TokensClaimed,
            "status_changed" => Self::StatusChanged,
            "funds_withdrawn" => Self::FundsWithdrawn,
            "config_updated" => Self::ConfigUpdated,
            "admin_transferred" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }
}

/// A decoded round event, ready to be stored.
///
/// Token amounts are `i128` on chain and kept as decimal strings here.
/// The meaning of `actor` and `detail` depends on the kind:
///
/// | kind                  | actor         | amount             | issued | detail            |
/// |-----------------------|---------------|--------------------|--------|-------------------|
/// | investment_added      | investor      | deposit            |        |                   |
/// | investment_cancelled  | investor      | refunded deposit   |        |                   |
/// | tokens_claimed        | investor      | converted deposit  | issued |                   |
/// | status_changed        |               |                    |        | `from->to`        |
/// | funds_withdrawn       | destination   | swept amount       |        |                   |
/// | config_updated        |               | new value          |        | parameter name    |
/// | admin_transferred     | new admin     |                    |        | previous admin    |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEvent {
    /// RPC event id; unique per contract event.
    pub event_id: String,
    pub event_type: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub issued: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event row as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub issued: Option<String>,
    pub detail: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl RoundEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}
