//! # Issuance Round Contract
//!
//! A time-boxed capital-raising round. Investors deposit a currency token
//! while the round is open; once the window closes and the soft cap is
//! met, the administrator starts distribution and investors claim issued
//! tokens at the configured price. A failed round lets investors reclaim
//! their capital instead.
//!
//! | Phase         | Entry Point(s)                                        |
//! |---------------|-------------------------------------------------------|
//! | Bootstrap     | [`IssuanceRound::init`], `transfer_admin`             |
//! | Configuration | `set_issue_price`, `set_opening_date`, `set_closing_date`, `set_soft_cap`, `set_min_investment` |
//! | Funding       | `open_issuance`, `invest`, `cancel_investment`        |
//! | Settlement    | `start_distribution`, `claim`, `withdraw`             |
//! | Abort         | `cancel_all_investments`, `cancel_investment`         |
//! | Queries       | `current_state`, `get_round`, `investment_of`, ...    |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], storage access to [`storage`],
//! the lifecycle and ledger rules to [`round`], and token movements to the
//! [`Treasury`] implementation in [`treasury`]. This file contains only the
//! public entry points.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env};

mod events;
mod price;
mod rbac;
mod round;
mod storage;
mod treasury;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_treasury;

pub use treasury::{Asset, TokenTreasury, Treasury};
pub use types::{Round, RoundStatus};

use types::{RoundConfig, RoundState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized   = 1,
    NotInitialized       = 2,
    NotAuthorized        = 3,
    // Timing
    OutsideWindow        = 4,
    WindowNotClosed      = 5,
    // Lifecycle
    InvalidState         = 6,
    Reentrant            = 7,
    // Funding
    SoftCapNotReached    = 8,
    InsufficientFunds    = 9,
    TransferFailed       = 10,
    MintFailed           = 11,
    // Validation
    InvalidPrice         = 12,
    PriceNotSet          = 13,
    InvalidAmount        = 14,
    InvalidWindow        = 15,
    FractionalInvestment = 16,
    BelowMinInvestment   = 17,
    Overflow             = 18,
    // Ledger
    NoInvestment         = 19,
}

#[contract]
pub struct IssuanceRound;

fn token_treasury(env: &Env) -> Result<TokenTreasury<'_>, Error> {
    let config = storage::load_config(env)?;
    Ok(TokenTreasury::new(env, &config))
}

#[contractimpl]
impl IssuanceRound {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the round.
    ///
    /// Must be called exactly once after deployment. The round must also be
    /// made admin of `issuance_token` so that claims can mint.
    pub fn init(
        env: Env,
        admin: Address,
        issuance_token: Address,
        currency_token: Address,
    ) -> Result<(), Error> {
        admin.require_auth();
        rbac::init_admin(&env, &admin)?;

        storage::save_config(
            &env,
            &RoundConfig {
                issuance_token,
                currency_token,
                issue_price: 0,
                opening_date: 0,
                closing_date: 0,
                soft_cap: 0,
                min_investment: 0,
            },
        );
        storage::save_state(&env, &RoundState::new());
        Ok(())
    }

    /// Hand the administrator role to `new_admin`.
    pub fn transfer_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::transfer_admin(&env, &caller, &new_admin)
    }

    // ─────────────────────────────────────────────────────────
    // Configuration (administrator)
    // ─────────────────────────────────────────────────────────

    /// Set the issue price. Zero is rejected; only allowed before opening.
    pub fn set_issue_price(env: Env, caller: Address, price: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::set_issue_price(&env, price)
    }

    pub fn set_opening_date(env: Env, caller: Address, opening_date: u64) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::set_opening_date(&env, opening_date)
    }

    pub fn set_closing_date(env: Env, caller: Address, closing_date: u64) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::set_closing_date(&env, closing_date)
    }

    /// Set the funding threshold checked by `start_distribution`.
    pub fn set_soft_cap(env: Env, caller: Address, soft_cap: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::set_soft_cap(&env, soft_cap)
    }

    pub fn set_min_investment(env: Env, caller: Address, min_investment: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::set_min_investment(&env, min_investment)
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle (administrator)
    // ─────────────────────────────────────────────────────────

    pub fn open_issuance(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::open_issuance(&env)
    }

    pub fn start_distribution(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::start_distribution(&env)
    }

    /// Abort the round. Investors then reclaim through `cancel_investment`.
    pub fn cancel_all_investments(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        round::cancel_all_investments(&env)
    }

    /// Sweep the raised currency to `destination`. Returns the swept amount.
    pub fn withdraw(env: Env, caller: Address, destination: Address) -> Result<i128, Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        let treasury = token_treasury(&env)?;
        round::withdraw(&env, &treasury, &destination)
    }

    // ─────────────────────────────────────────────────────────
    // Investor self-service
    // ─────────────────────────────────────────────────────────

    /// Deposit `amount` of the currency token. Returns the investor's
    /// cumulative deposit.
    pub fn invest(env: Env, investor: Address, amount: i128) -> Result<i128, Error> {
        investor.require_auth();
        let treasury = token_treasury(&env)?;
        round::invest(&env, &treasury, &investor, amount)
    }

    /// Claim issued tokens for the whole deposit. Returns the issued amount.
    pub fn claim(env: Env, investor: Address) -> Result<i128, Error> {
        investor.require_auth();
        let treasury = token_treasury(&env)?;
        round::claim(&env, &treasury, &investor)
    }

    /// Reclaim the whole deposit. Returns the refunded amount.
    pub fn cancel_investment(env: Env, investor: Address) -> Result<i128, Error> {
        investor.require_auth();
        let treasury = token_treasury(&env)?;
        round::cancel_investment(&env, &treasury, &investor)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn current_state(env: Env) -> Result<RoundStatus, Error> {
        Ok(storage::load_state(&env)?.status)
    }

    pub fn issue_price(env: Env) -> Result<i128, Error> {
        Ok(storage::load_config(&env)?.issue_price)
    }

    pub fn opening_date(env: Env) -> Result<u64, Error> {
        Ok(storage::load_config(&env)?.opening_date)
    }

    pub fn closing_date(env: Env) -> Result<u64, Error> {
        Ok(storage::load_config(&env)?.closing_date)
    }

    pub fn soft_cap(env: Env) -> Result<i128, Error> {
        Ok(storage::load_config(&env)?.soft_cap)
    }

    pub fn min_investment(env: Env) -> Result<i128, Error> {
        Ok(storage::load_config(&env)?.min_investment)
    }

    /// Outstanding deposit of `investor`; zero after a claim or cancellation.
    pub fn investment_of(env: Env, investor: Address) -> i128 {
        storage::investment_of(&env, &investor)
    }

    pub fn total_raised(env: Env) -> Result<i128, Error> {
        Ok(storage::load_state(&env)?.total_raised)
    }

    pub fn outstanding(env: Env) -> Result<i128, Error> {
        Ok(storage::load_state(&env)?.outstanding)
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        rbac::admin(&env)
    }

    pub fn get_round(env: Env) -> Result<Round, Error> {
        storage::load_round(&env)
    }
}
