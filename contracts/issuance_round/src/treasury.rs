//! # Treasury
//!
//! Boundary between the round and the two assets it handles. The round
//! never touches a token contract directly: it pulls currency into its own
//! custody, pushes currency back out, and mints issued tokens, all through
//! the [`Treasury`] trait.
//!
//! [`TokenTreasury`] is the on-chain implementation. Currency moves through
//! the standard token interface; issued tokens are minted through the
//! Stellar Asset Contract admin interface, which requires the round to be
//! the issuance token's admin.

use soroban_sdk::{token, Address, Env};

use crate::types::RoundConfig;
use crate::Error;

/// Which of the round's two assets an operation targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Asset {
    /// The asset investors deposit.
    Currency,
    /// The asset investors receive on claim.
    Issuance,
}

/// Value-transfer capabilities consumed by the round.
pub trait Treasury {
    /// Move `amount` of `asset` from `from` into the round's custody.
    fn pull(&self, asset: Asset, from: &Address, amount: i128) -> Result<(), Error>;

    /// Move `amount` of `asset` from the round's custody to `to`.
    fn push(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error>;

    /// Create `amount` of `asset` and credit it to `to`.
    fn mint_to(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error>;
}

/// [`Treasury`] backed by Soroban token contracts.
pub struct TokenTreasury<'a> {
    env: &'a Env,
    currency: Address,
    issuance: Address,
}

impl<'a> TokenTreasury<'a> {
    pub fn new(env: &'a Env, config: &RoundConfig) -> Self {
        Self {
            env,
            currency: config.currency_token.clone(),
            issuance: config.issuance_token.clone(),
        }
    }

    fn token(&self, asset: Asset) -> &Address {
        match asset {
            Asset::Currency => &self.currency,
            Asset::Issuance => &self.issuance,
        }
    }
}

impl Treasury for TokenTreasury<'_> {
    fn pull(&self, asset: Asset, from: &Address, amount: i128) -> Result<(), Error> {
        let client = token::Client::new(self.env, self.token(asset));
        match client.try_transfer(from, &self.env.current_contract_address(), &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::InsufficientFunds),
        }
    }

    fn push(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error> {
        let client = token::Client::new(self.env, self.token(asset));
        match client.try_transfer(&self.env.current_contract_address(), to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::TransferFailed),
        }
    }

    fn mint_to(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error> {
        let client = token::StellarAssetClient::new(self.env, self.token(asset));
        match client.try_mint(to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(Error::MintFailed),
        }
    }
}
