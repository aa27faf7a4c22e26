//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the round.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key      | Type          | Description                              |
//! |----------|---------------|------------------------------------------|
//! | `Admin`  | `Address`     | Round administrator                      |
//! | `Config` | `RoundConfig` | Administrator-controlled parameters      |
//! | `State`  | `RoundState`  | Status and running totals                |
//! | `Locked` | `bool`        | Present while a fund-moving call runs    |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                   | Type   | Description                          |
//! |-----------------------|--------|--------------------------------------|
//! | `Investment(address)` | `i128` | Outstanding deposit of one investor  |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days
//! remaining. A zeroed ledger entry is removed rather than stored as `0`.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{Round, RoundConfig, RoundState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Round administrator (Instance).
    Admin,
    /// Round parameters (Instance).
    Config,
    /// Status and totals (Instance).
    State,
    /// Re-entrancy flag (Instance).
    Locked,
    /// Outstanding deposit keyed by investor (Persistent).
    Investment(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn save_config(env: &Env, config: &RoundConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> Result<RoundConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn save_state(env: &Env, state: &RoundState) {
    env.storage().instance().set(&DataKey::State, state);
    bump_instance(env);
}

pub fn load_state(env: &Env) -> Result<RoundState, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .ok_or(Error::NotInitialized)
}

/// Load the full `Round` by combining config and state.
pub fn load_round(env: &Env) -> Result<Round, Error> {
    Ok(Round::from_parts(load_config(env)?, load_state(env)?))
}

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Locked)
}

pub fn set_locked(env: &Env, locked: bool) {
    if locked {
        env.storage().instance().set(&DataKey::Locked, &true);
    } else {
        env.storage().instance().remove(&DataKey::Locked);
    }
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Outstanding deposit of `investor`, `0` when there is no entry.
pub fn investment_of(env: &Env, investor: &Address) -> i128 {
    let key = DataKey::Investment(investor.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(amount) => {
            bump_persistent(env, &key);
            amount
        }
        None => 0,
    }
}

pub fn set_investment(env: &Env, investor: &Address, amount: i128) {
    let key = DataKey::Investment(investor.clone());
    env.storage().persistent().set(&key, &amount);
    bump_persistent(env, &key);
}

/// Zero the ledger entry of `investor`.
pub fn clear_investment(env: &Env, investor: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Investment(investor.clone()));
}
