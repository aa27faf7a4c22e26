//! # Types
//!
//! Shared data structures used across all modules of the issuance round.
//!
//! ## Config / State split
//!
//! The round is stored as two instance entries:
//!
//! - [`RoundConfig`] — written by the administrator setters only.
//! - [`RoundState`] — written on every investment, cancellation and claim.
//!
//! The public API exposes the reconstructed [`Round`] struct for convenience.
//!
//! ## Status as a Finite-State Machine
//!
//! [`RoundStatus`] only moves forward:
//!
//! ```text
//! Init ──► Open ──► Live
//!           │        │
//!           └──► Failed ◄┘
//! ```
//!
//! `Failed` is absorbing. A `Live` round ends once every investor claimed.

use soroban_sdk::{contracttype, Address};

/// Lifecycle status of the round.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundStatus {
    /// Deployed, parameters being configured.
    Init,
    /// Accepting investments inside the window.
    Open,
    /// Funded and closed; investors claim issued tokens.
    Live,
    /// Aborted; investors reclaim their capital.
    Failed,
}

impl RoundStatus {
    /// Whether `self -> next` is one of the allowed forward transitions.
    pub fn can_transition_to(self, next: RoundStatus) -> bool {
        matches!(
            (self, next),
            (RoundStatus::Init, RoundStatus::Open)
                | (RoundStatus::Open, RoundStatus::Live)
                | (RoundStatus::Open, RoundStatus::Failed)
                | (RoundStatus::Live, RoundStatus::Failed)
        )
    }
}

/// Administrator-controlled round parameters.
///
/// A zero `opening_date`/`closing_date` means the bound has not been set
/// yet; a zero `issue_price` means no price has been configured.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundConfig {
    /// Token minted to investors on claim.
    pub issuance_token: Address,
    /// Token investors deposit.
    pub currency_token: Address,
    /// Positive: currency units per issued unit. Negative: issued units per currency unit.
    pub issue_price: i128,
    pub opening_date: u64,
    pub closing_date: u64,
    /// Currency amount required to go live.
    pub soft_cap: i128,
    /// Smallest accepted single investment.
    pub min_investment: i128,
}

/// Mutable round state, updated on every accounting operation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundState {
    pub status: RoundStatus,
    /// Capital raised net of cancellations. Claims leave it untouched.
    pub total_raised: i128,
    /// Sum of all investor ledger entries still unclaimed and uncancelled.
    pub outstanding: i128,
    /// Currency already swept to the administrator's wallet.
    pub withdrawn: i128,
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            status: RoundStatus::Init,
            total_raised: 0,
            outstanding: 0,
            withdrawn: 0,
        }
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

/// Full view of the round, reconstructed from config and state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    pub issuance_token: Address,
    pub currency_token: Address,
    pub issue_price: i128,
    pub opening_date: u64,
    pub closing_date: u64,
    pub soft_cap: i128,
    pub min_investment: i128,
    pub status: RoundStatus,
    pub total_raised: i128,
    pub outstanding: i128,
    pub withdrawn: i128,
}

impl Round {
    pub fn from_parts(config: RoundConfig, state: RoundState) -> Self {
        Self {
            issuance_token: config.issuance_token,
            currency_token: config.currency_token,
            issue_price: config.issue_price,
            opening_date: config.opening_date,
            closing_date: config.closing_date,
            soft_cap: config.soft_cap,
            min_investment: config.min_investment,
            status: state.status,
            total_raised: state.total_raised,
            outstanding: state.outstanding,
            withdrawn: state.withdrawn,
        }
    }
}
