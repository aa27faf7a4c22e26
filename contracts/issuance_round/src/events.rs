//! Records published by the round for off-chain indexers.
//!
//! Every investor-facing record carries the investor address as its second
//! topic so indexers can filter one investor's history without decoding
//! the data payload.

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::RoundStatus;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvestmentAdded {
    pub investor: Address,
    pub amount: i128,
}

/// `amount` is the investor's cumulative deposit, not a single investment.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvestmentCancelled {
    pub investor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensClaimed {
    pub investor: Address,
    pub invested: i128,
    pub issued: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusChanged {
    pub from: RoundStatus,
    pub to: RoundStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsWithdrawn {
    pub destination: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminTransferred {
    pub previous: Address,
    pub admin: Address,
}

pub fn investment_added(env: &Env, investor: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("invested"), investor.clone()),
        InvestmentAdded {
            investor: investor.clone(),
            amount,
        },
    );
}

pub fn investment_cancelled(env: &Env, investor: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("cancelled"), investor.clone()),
        InvestmentCancelled {
            investor: investor.clone(),
            amount,
        },
    );
}

pub fn tokens_claimed(env: &Env, investor: &Address, invested: i128, issued: i128) {
    env.events().publish(
        (symbol_short!("claimed"), investor.clone()),
        TokensClaimed {
            investor: investor.clone(),
            invested,
            issued,
        },
    );
}

pub fn status_changed(env: &Env, from: RoundStatus, to: RoundStatus) {
    env.events()
        .publish((symbol_short!("status"),), StatusChanged { from, to });
}

pub fn funds_withdrawn(env: &Env, destination: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("withdrawn"),),
        FundsWithdrawn {
            destination: destination.clone(),
            amount,
        },
    );
}

pub fn admin_transferred(env: &Env, previous: &Address, admin: &Address) {
    env.events().publish(
        (symbol_short!("admin_set"),),
        AdminTransferred {
            previous: previous.clone(),
            admin: admin.clone(),
        },
    );
}

/// A round parameter changed. `name` is one of `price`, `soft_cap`, `min_inv`.
pub fn amount_param_set(env: &Env, name: Symbol, value: i128) {
    env.events().publish((symbol_short!("config"), name), value);
}

/// A window bound changed. `name` is `opens` or `closes`.
pub fn date_param_set(env: &Env, name: Symbol, value: u64) {
    env.events().publish((symbol_short!("config"), name), value);
}
