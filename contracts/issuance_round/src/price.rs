//! Price conversion between deposited currency and issued tokens.
//!
//! The issue price is a signed integer so that no fractional price ever has
//! to be represented:
//!
//! - `price > 0`: `price` currency units buy one issued unit, so a deposit of
//!   `amount` converts to `amount / price`. Investments must be exact
//!   multiples of the price, which keeps that division exact.
//! - `price < 0`: every currency unit buys `|price|` issued units, so a
//!   deposit converts to `amount * |price|`.
//! - `price == 0` is never a valid configuration.

use crate::Error;

/// Convert a deposited `amount` into the issued amount at `price`.
pub fn convert(amount: i128, price: i128) -> Result<i128, Error> {
    if price > 0 {
        Ok(amount / price)
    } else if price < 0 {
        price
            .checked_abs()
            .and_then(|rate| amount.checked_mul(rate))
            .ok_or(Error::Overflow)
    } else {
        Err(Error::InvalidPrice)
    }
}

/// Whether `amount` converts at `price` without a fractional remainder.
pub fn is_whole_investment(amount: i128, price: i128) -> bool {
    price <= 0 || amount % price == 0
}

/// Whether `price` may be configured as an issue price.
pub fn is_valid_price(price: i128) -> bool {
    price != 0 && price.checked_abs().is_some()
}
