//! Round operations driven through hand-written [`Treasury`] implementations.
//!
//! These run `round::*` directly inside the contract's storage context, so
//! they observe exactly what a token contract would observe mid-operation.

extern crate std;

use core::cell::RefCell;
use std::vec::Vec;

use soroban_sdk::{Address, Env};

use crate::round::{self, NonReentrant};
use crate::storage;
use crate::test::{setup, UNIT};
use crate::treasury::{Asset, Treasury};
use crate::Error;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Pull(Asset, Address, i128),
    Push(Asset, Address, i128),
    Mint(Asset, Address, i128),
}

/// Accepts every movement and records it.
#[derive(Default)]
struct RecordingTreasury {
    calls: RefCell<Vec<Call>>,
}

impl RecordingTreasury {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Treasury for RecordingTreasury {
    fn pull(&self, asset: Asset, from: &Address, amount: i128) -> Result<(), Error> {
        self.calls
            .borrow_mut()
            .push(Call::Pull(asset, from.clone(), amount));
        Ok(())
    }

    fn push(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error> {
        self.calls
            .borrow_mut()
            .push(Call::Push(asset, to.clone(), amount));
        Ok(())
    }

    fn mint_to(&self, asset: Asset, to: &Address, amount: i128) -> Result<(), Error> {
        self.calls
            .borrow_mut()
            .push(Call::Mint(asset, to.clone(), amount));
        Ok(())
    }
}

/// Reads the ledger entry of the counterparty while the transfer is in flight.
struct ObservingTreasury {
    env: Env,
    seen: RefCell<Vec<i128>>,
}

impl ObservingTreasury {
    fn observe(&self, investor: &Address) {
        self.seen
            .borrow_mut()
            .push(storage::investment_of(&self.env, investor));
    }
}

impl Treasury for ObservingTreasury {
    fn pull(&self, _: Asset, from: &Address, _: i128) -> Result<(), Error> {
        self.observe(from);
        Ok(())
    }

    fn push(&self, _: Asset, to: &Address, _: i128) -> Result<(), Error> {
        self.observe(to);
        Ok(())
    }

    fn mint_to(&self, _: Asset, to: &Address, _: i128) -> Result<(), Error> {
        self.observe(to);
        Ok(())
    }
}

/// Calls back into the round from inside every transfer.
struct ReentrantTreasury {
    env: Env,
    reentry: RefCell<Vec<Result<i128, Error>>>,
}

impl ReentrantTreasury {
    fn new(env: &Env) -> Self {
        Self {
            env: env.clone(),
            reentry: RefCell::new(Vec::new()),
        }
    }
}

impl Treasury for ReentrantTreasury {
    fn pull(&self, _: Asset, from: &Address, amount: i128) -> Result<(), Error> {
        let inner = RecordingTreasury::default();
        let result = round::invest(&self.env, &inner, from, amount);
        self.reentry.borrow_mut().push(result);
        Ok(())
    }

    fn push(&self, _: Asset, to: &Address, _: i128) -> Result<(), Error> {
        let inner = RecordingTreasury::default();
        let result = round::cancel_investment(&self.env, &inner, to);
        self.reentry.borrow_mut().push(result);
        Ok(())
    }

    fn mint_to(&self, _: Asset, to: &Address, _: i128) -> Result<(), Error> {
        let inner = RecordingTreasury::default();
        let result = round::claim(&self.env, &inner, to);
        self.reentry.borrow_mut().push(result);
        Ok(())
    }
}

/// Refuses every movement.
struct EmptyTreasury;

impl Treasury for EmptyTreasury {
    fn pull(&self, _: Asset, _: &Address, _: i128) -> Result<(), Error> {
        Err(Error::InsufficientFunds)
    }

    fn push(&self, _: Asset, _: &Address, _: i128) -> Result<(), Error> {
        Err(Error::TransferFailed)
    }

    fn mint_to(&self, _: Asset, _: &Address, _: i128) -> Result<(), Error> {
        Err(Error::MintFailed)
    }
}

#[test]
fn test_invest_pulls_currency_once() {
    let s = setup();
    s.open_at_price(5);
    let treasury = RecordingTreasury::default();

    let balance = s.env.as_contract(&s.client.address, || {
        round::invest(&s.env, &treasury, &s.investor1, 50 * UNIT)
    });

    assert_eq!(balance, Ok(50 * UNIT));
    assert_eq!(
        treasury.calls(),
        std::vec![Call::Pull(Asset::Currency, s.investor1.clone(), 50 * UNIT)]
    );
}

#[test]
fn test_cancel_pushes_currency_back() {
    let s = setup();
    s.open_at_price(5);
    s.invest_both();
    let treasury = RecordingTreasury::default();

    let refunded = s.env.as_contract(&s.client.address, || {
        round::cancel_investment(&s.env, &treasury, &s.investor2)
    });

    assert_eq!(refunded, Ok(10 * UNIT));
    assert_eq!(
        treasury.calls(),
        std::vec![Call::Push(Asset::Currency, s.investor2.clone(), 10 * UNIT)]
    );
}

#[test]
fn test_claim_mints_issuance() {
    let s = setup();
    s.open_at_price(5);
    s.invest_both();
    s.close_window();
    s.client.start_distribution(&s.admin);
    let treasury = RecordingTreasury::default();

    let issued = s.env.as_contract(&s.client.address, || {
        round::claim(&s.env, &treasury, &s.investor1)
    });

    assert_eq!(issued, Ok(10 * UNIT));
    assert_eq!(
        treasury.calls(),
        std::vec![Call::Mint(Asset::Issuance, s.investor1.clone(), 10 * UNIT)]
    );
}

#[test]
fn test_withdraw_pushes_currency_to_destination() {
    let s = setup();
    s.open_at_price(5);
    s.invest_both();
    s.close_window();
    s.client.start_distribution(&s.admin);
    let treasury = RecordingTreasury::default();

    let swept = s.env.as_contract(&s.client.address, || {
        round::withdraw(&s.env, &treasury, &s.wallet)
    });

    assert_eq!(swept, Ok(60 * UNIT));
    assert_eq!(
        treasury.calls(),
        std::vec![Call::Push(Asset::Currency, s.wallet.clone(), 60 * UNIT)]
    );
}

#[test]
fn test_ledger_is_updated_before_transfers() {
    let s = setup();
    s.open_at_price(5);
    let treasury = ObservingTreasury {
        env: s.env.clone(),
        seen: RefCell::new(Vec::new()),
    };

    s.env.as_contract(&s.client.address, || {
        round::invest(&s.env, &treasury, &s.investor1, 50 * UNIT).unwrap();
        round::invest(&s.env, &treasury, &s.investor1, 10 * UNIT).unwrap();
        round::cancel_investment(&s.env, &treasury, &s.investor1).unwrap();
        round::invest(&s.env, &treasury, &s.investor1, 20 * UNIT).unwrap();
    });
    s.close_window();
    s.env.as_contract(&s.client.address, || {
        round::set_soft_cap(&s.env, 0).unwrap();
    });
    s.client.start_distribution(&s.admin);
    s.env.as_contract(&s.client.address, || {
        round::claim(&s.env, &treasury, &s.investor1).unwrap();
    });

    // The pull sees the credited balance; the refund and the mint see it zeroed.
    assert_eq!(
        *treasury.seen.borrow(),
        std::vec![50 * UNIT, 60 * UNIT, 0, 20 * UNIT, 0]
    );
}

#[test]
fn test_reentrant_treasury_is_rejected() {
    let s = setup();
    s.open_at_price(5);
    let treasury = ReentrantTreasury::new(&s.env);

    s.env.as_contract(&s.client.address, || {
        round::invest(&s.env, &treasury, &s.investor1, 50 * UNIT).unwrap();
        round::cancel_investment(&s.env, &treasury, &s.investor1).unwrap();
        round::invest(&s.env, &treasury, &s.investor1, 50 * UNIT).unwrap();
    });
    s.close_window();
    s.client.start_distribution(&s.admin);
    let issued = s.env.as_contract(&s.client.address, || {
        round::claim(&s.env, &treasury, &s.investor1)
    });

    assert_eq!(issued, Ok(10 * UNIT));
    assert_eq!(
        *treasury.reentry.borrow(),
        std::vec![
            Err(Error::Reentrant),
            Err(Error::Reentrant),
            Err(Error::Reentrant),
            Err(Error::Reentrant),
        ]
    );
    // The nested calls changed nothing and the lock is released.
    assert_eq!(s.client.investment_of(&s.investor1), 0);
    assert_eq!(s.client.outstanding(), 0);
    assert_eq!(s.client.total_raised(), 50 * UNIT);
    s.env.as_contract(&s.client.address, || {
        assert!(!storage::is_locked(&s.env));
    });
}

#[test]
fn test_guard_rejects_nested_entry_and_releases_on_drop() {
    let s = setup();
    s.env.as_contract(&s.client.address, || {
        let guard = NonReentrant::enter(&s.env).unwrap();
        assert!(matches!(NonReentrant::enter(&s.env), Err(Error::Reentrant)));
        drop(guard);
        assert!(NonReentrant::enter(&s.env).is_ok());
        assert!(!storage::is_locked(&s.env));
    });
}

#[test]
fn test_guard_is_released_after_rejected_operation() {
    let s = setup();
    s.open_at_price(5);

    let result = s.env.as_contract(&s.client.address, || {
        round::invest(&s.env, &RecordingTreasury::default(), &s.investor1, UNIT + 1)
    });
    assert_eq!(result, Err(Error::FractionalInvestment));

    s.env.as_contract(&s.client.address, || {
        assert!(!storage::is_locked(&s.env));
    });
}

#[test]
fn test_treasury_failures_are_propagated() {
    let s = setup();
    s.open_at_price(5);

    let result = s.env.as_contract(&s.client.address, || {
        round::invest(&s.env, &EmptyTreasury, &s.investor1, 50 * UNIT)
    });
    assert_eq!(result, Err(Error::InsufficientFunds));
}
