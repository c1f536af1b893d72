//! Precondition checks run before any message is built.

use crate::domain::{to_micro, Address, Currency};
use crate::error::EarnError;
use crate::ledger::LedgerQuery;
use tracing::debug;

/// Parse a caller amount into micro units, rejecting zero.
pub fn nonzero_micro(amount: &str) -> Result<u128, EarnError> {
    let micro = to_micro(amount)?;
    if micro == 0 {
        return Err(EarnError::ZeroAmount);
    }
    Ok(micro)
}

/// Require `address` to hold at least `requested` micro units of `currency`.
pub async fn native_balance(
    query: &LedgerQuery,
    address: &Address,
    currency: Currency,
    requested: u128,
) -> Result<(), EarnError> {
    let available = query.account_balance(address, currency).await?;
    debug!(
        "Native balance check address={} currency={} requested={} available={}",
        address, currency, requested, available
    );
    if available < requested {
        return Err(EarnError::InsufficientBalance {
            currency: currency.to_string(),
            requested,
            available,
        });
    }
    Ok(())
}

/// Require a non-empty receipt position covering `requested` micro units.
pub async fn receipt_balance(
    query: &LedgerQuery,
    address: &Address,
    currency: Currency,
    requested: u128,
) -> Result<(), EarnError> {
    let available = query.receipt_balance(address, currency).await?;
    debug!(
        "Receipt balance check address={} market={} requested={} available={}",
        address, currency, requested, available
    );
    if available == 0 {
        return Err(EarnError::NoDeposit);
    }
    if requested > available {
        return Err(EarnError::InsufficientBalance {
            currency: Currency::Aust.to_string(),
            requested,
            available,
        });
    }
    Ok(())
}
