//! # Access control
//!
//! The round has a single privileged role, the administrator. It configures
//! the round, drives the `Open -> Live` and `-> Failed` transitions and
//! sweeps the raised currency. Everything else is investor self-service.
//!
//! Callers pass their own address and sign for it; the checks here only
//! compare that address to the stored administrator.

use soroban_sdk::{Address, Env};

use crate::events;
use crate::storage;
use crate::Error;

/// Record the first administrator. Fails if the round is already initialised.
pub fn init_admin(env: &Env, admin: &Address) -> Result<(), Error> {
    if storage::has_admin(env) {
        return Err(Error::AlreadyInitialized);
    }
    storage::set_admin(env, admin);
    Ok(())
}

/// Return the current administrator.
pub fn admin(env: &Env) -> Result<Address, Error> {
    storage::get_admin(env)
}

/// Fail with `NotAuthorized` unless `caller` is the administrator.
pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    if storage::get_admin(env)? != *caller {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

/// Hand the administrator role from `current` to `new_admin`.
///
/// The previous administrator loses the role immediately.
pub fn transfer_admin(env: &Env, current: &Address, new_admin: &Address) -> Result<(), Error> {
    require_admin(env, current)?;
    storage::set_admin(env, new_admin);
    events::admin_transferred(env, current, new_admin);
    Ok(())
}
