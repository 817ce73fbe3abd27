//! Utility functions for identifiers and lenient argument parsing

use super::types::Amount;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique account id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Parses an amount argument. Anything non-numeric becomes zero rather than an error.
pub fn parse_amount(raw: &str) -> Amount {
    match raw.trim().parse::<Amount>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(raw, "amount is not numeric, treating as zero");
            0.0
        }
    }
}

/// Amounts reaching the ledger must be finite and not negative.
pub fn validate_amount(amount: Amount) -> Result<(), crate::error::LedgerError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(crate::error::LedgerError::Validation(format!(
            "invalid amount {amount}"
        )));
    }
    Ok(())
}

/// Record ids share one keyspace with the ledger's own bookkeeping keys, which all contain `:`.
pub fn validate_record_id(id: &str) -> Result<(), crate::error::LedgerError> {
    if id.trim().is_empty() || id.contains(':') {
        return Err(crate::error::LedgerError::Validation(format!(
            "invalid record id {id:?}"
        )));
    }
    Ok(())
}
