//! # Round
//!
//! The issuance round's state machine and investment ledger.
//!
//! Every function here assumes authorization has already been checked by
//! the entry point in `lib.rs`. Fund-moving functions share one discipline:
//!
//! 1. enter the [`NonReentrant`] guard,
//! 2. validate the status, the clock and the arguments,
//! 3. write the ledger entry and the running totals,
//! 4. call the [`Treasury`],
//! 5. publish the record.
//!
//! A treasury that calls back into the round during step 4 hits the guard,
//! and would in any case only observe the already-updated ledger.

use soroban_sdk::{symbol_short, Address, Env};

use crate::events;
use crate::price;
use crate::storage;
use crate::treasury::{Asset, Treasury};
use crate::types::{RoundConfig, RoundState, RoundStatus};
use crate::Error;

// ─────────────────────────────────────────────────────────
// Re-entrancy guard
// ─────────────────────────────────────────────────────────

/// Holds the round's `Locked` flag for the lifetime of one operation.
pub struct NonReentrant<'a> {
    env: &'a Env,
}

impl<'a> NonReentrant<'a> {
    pub fn enter(env: &'a Env) -> Result<Self, Error> {
        if storage::is_locked(env) {
            return Err(Error::Reentrant);
        }
        storage::set_locked(env, true);
        Ok(Self { env })
    }
}

impl Drop for NonReentrant<'_> {
    fn drop(&mut self) {
        storage::set_locked(self.env, false);
    }
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

fn now(env: &Env) -> u64 {
    env.ledger().timestamp()
}

/// The investable window is inclusive at both ends.
fn within_window(env: &Env, config: &RoundConfig) -> bool {
    let now = now(env);
    config.opening_date <= now && now <= config.closing_date
}

fn transition(env: &Env, state: &mut RoundState, next: RoundStatus) -> Result<(), Error> {
    if !state.status.can_transition_to(next) {
        return Err(Error::InvalidState);
    }
    let from = state.status;
    state.status = next;
    storage::save_state(env, state);
    events::status_changed(env, from, next);
    Ok(())
}

/// Parameters may change in `Init`, and some of them still in `Open`.
fn ensure_configurable(env: &Env, allow_open: bool) -> Result<RoundConfig, Error> {
    match storage::load_state(env)?.status {
        RoundStatus::Init => {}
        RoundStatus::Open if allow_open => {}
        _ => return Err(Error::InvalidState),
    }
    storage::load_config(env)
}

// ─────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────

pub fn set_issue_price(env: &Env, issue_price: i128) -> Result<(), Error> {
    let mut config = ensure_configurable(env, false)?;
    if !price::is_valid_price(issue_price) {
        return Err(Error::InvalidPrice);
    }
    config.issue_price = issue_price;
    storage::save_config(env, &config);
    events::amount_param_set(env, symbol_short!("price"), issue_price);
    Ok(())
}

pub fn set_opening_date(env: &Env, opening_date: u64) -> Result<(), Error> {
    let mut config = ensure_configurable(env, true)?;
    if config.closing_date != 0 && opening_date >= config.closing_date {
        return Err(Error::InvalidWindow);
    }
    config.opening_date = opening_date;
    storage::save_config(env, &config);
    events::date_param_set(env, symbol_short!("opens"), opening_date);
    Ok(())
}

pub fn set_closing_date(env: &Env, closing_date: u64) -> Result<(), Error> {
    let mut config = ensure_configurable(env, true)?;
    if closing_date <= config.opening_date {
        return Err(Error::InvalidWindow);
    }
    config.closing_date = closing_date;
    storage::save_config(env, &config);
    events::date_param_set(env, symbol_short!("closes"), closing_date);
    Ok(())
}

pub fn set_soft_cap(env: &Env, soft_cap: i128) -> Result<(), Error> {
    let mut config = ensure_configurable(env, true)?;
    if soft_cap < 0 {
        return Err(Error::InvalidAmount);
    }
    config.soft_cap = soft_cap;
    storage::save_config(env, &config);
    events::amount_param_set(env, symbol_short!("soft_cap"), soft_cap);
    Ok(())
}

pub fn set_min_investment(env: &Env, min_investment: i128) -> Result<(), Error> {
    let mut config = ensure_configurable(env, false)?;
    if min_investment < 0 {
        return Err(Error::InvalidAmount);
    }
    config.min_investment = min_investment;
    storage::save_config(env, &config);
    events::amount_param_set(env, symbol_short!("min_inv"), min_investment);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────

/// `Init -> Open`, inside the window and with a configured price.
pub fn open_issuance(env: &Env) -> Result<(), Error> {
    let _guard = NonReentrant::enter(env)?;
    let config = storage::load_config(env)?;
    let mut state = storage::load_state(env)?;

    if state.status != RoundStatus::Init {
        return Err(Error::InvalidState);
    }
    if config.issue_price == 0 {
        return Err(Error::PriceNotSet);
    }
    if !within_window(env, &config) {
        return Err(Error::OutsideWindow);
    }
    transition(env, &mut state, RoundStatus::Open)
}

/// `Open -> Live`, strictly after the window closed and with the soft cap met.
pub fn start_distribution(env: &Env) -> Result<(), Error> {
    let _guard = NonReentrant::enter(env)?;
    let config = storage::load_config(env)?;
    let mut state = storage::load_state(env)?;

    if state.status != RoundStatus::Open {
        return Err(Error::InvalidState);
    }
    if now(env) <= config.closing_date {
        return Err(Error::WindowNotClosed);
    }
    if state.total_raised < config.soft_cap {
        return Err(Error::SoftCapNotReached);
    }
    transition(env, &mut state, RoundStatus::Live)
}

/// `Open | Live -> Failed`, regardless of the clock and the soft cap.
///
/// A live round can only be failed while none of the raised currency has
/// been swept, so every unclaimed investor can still be refunded.
pub fn cancel_all_investments(env: &Env) -> Result<(), Error> {
    let _guard = NonReentrant::enter(env)?;
    let mut state = storage::load_state(env)?;

    if state.status == RoundStatus::Live && state.withdrawn > 0 {
        return Err(Error::InvalidState);
    }
    transition(env, &mut state, RoundStatus::Failed)
}

// ─────────────────────────────────────────────────────────
// Investment ledger
// ─────────────────────────────────────────────────────────

/// Deposit `amount` of currency for `investor`.
///
/// Returns the investor's cumulative outstanding deposit.
pub fn invest<T: Treasury>(
    env: &Env,
    treasury: &T,
    investor: &Address,
    amount: i128,
) -> Result<i128, Error> {
    let _guard = NonReentrant::enter(env)?;
    let config = storage::load_config(env)?;
    let mut state = storage::load_state(env)?;

    if state.status != RoundStatus::Open {
        return Err(Error::InvalidState);
    }
    if !within_window(env, &config) {
        return Err(Error::OutsideWindow);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    if !price::is_whole_investment(amount, config.issue_price) {
        return Err(Error::FractionalInvestment);
    }
    if amount < config.min_investment {
        return Err(Error::BelowMinInvestment);
    }

    let balance = storage::investment_of(env, investor)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    // The whole balance must stay claimable once the round is live.
    price::convert(balance, config.issue_price)?;
    state.total_raised = state
        .total_raised
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    state.outstanding = state
        .outstanding
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_investment(env, investor, balance);
    storage::save_state(env, &state);

    treasury.pull(Asset::Currency, investor, amount)?;

    events::investment_added(env, investor, amount);
    Ok(balance)
}

/// Return the whole outstanding deposit of `investor`.
///
/// Allowed while the round is `Open` or after it `Failed`. Returns the
/// refunded amount.
pub fn cancel_investment<T: Treasury>(
    env: &Env,
    treasury: &T,
    investor: &Address,
) -> Result<i128, Error> {
    let _guard = NonReentrant::enter(env)?;
    let mut state = storage::load_state(env)?;

    if !matches!(state.status, RoundStatus::Open | RoundStatus::Failed) {
        return Err(Error::InvalidState);
    }
    let amount = storage::investment_of(env, investor);
    if amount <= 0 {
        return Err(Error::NoInvestment);
    }

    storage::clear_investment(env, investor);
    state.total_raised -= amount;
    state.outstanding -= amount;
    storage::save_state(env, &state);

    treasury.push(Asset::Currency, investor, amount)?;

    events::investment_cancelled(env, investor, amount);
    Ok(amount)
}

/// Convert the outstanding deposit of `investor` into issued tokens.
///
/// `total_raised` is left untouched: the currency stays in custody until
/// the administrator sweeps it. Returns the issued amount.
pub fn claim<T: Treasury>(env: &Env, treasury: &T, investor: &Address) -> Result<i128, Error> {
    let _guard = NonReentrant::enter(env)?;
    let config = storage::load_config(env)?;
    let mut state = storage::load_state(env)?;

    if state.status != RoundStatus::Live {
        return Err(Error::InvalidState);
    }
    let invested = storage::investment_of(env, investor);
    if invested <= 0 {
        return Err(Error::NoInvestment);
    }
    let issued = price::convert(invested, config.issue_price)?;

    storage::clear_investment(env, investor);
    state.outstanding -= invested;
    storage::save_state(env, &state);

    treasury.mint_to(Asset::Issuance, investor, issued)?;

    events::tokens_claimed(env, investor, invested, issued);
    Ok(issued)
}

/// Sweep all raised currency not yet withdrawn to `destination`.
///
/// The amount comes from the round's own accounting, not from the token
/// balance: currency transferred to the contract outside `invest` is never
/// swept and stays stranded in custody.
///
/// Returns the swept amount, `0` when everything was already withdrawn.
pub fn withdraw<T: Treasury>(
    env: &Env,
    treasury: &T,
    destination: &Address,
) -> Result<i128, Error> {
    let _guard = NonReentrant::enter(env)?;
    let mut state = storage::load_state(env)?;

    if state.status != RoundStatus::Live {
        return Err(Error::InvalidState);
    }
    let amount = state.total_raised - state.withdrawn;
    if amount > 0 {
        state.withdrawn += amount;
        storage::save_state(env, &state);

        treasury.push(Asset::Currency, destination, amount)?;

        events::funds_withdrawn(env, destination, amount);
    }
    Ok(amount)
}
