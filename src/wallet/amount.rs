//! Token amount scaling

use crate::error::{HexlinkError, HexlinkResult};
use ethers_core::types::U256;
use ethers_core::utils::parse_units;

/// Largest exponent for which `10^decimals` fits in 256 bits
const MAX_DECIMALS: u8 = 77;

/// `amount * 10^decimals` in 256-bit arithmetic
pub fn normalize_amount_to_send(amount: u64, decimals: u8) -> HexlinkResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(HexlinkError::invalid_input(format!("decimals out of range: {}", decimals)));
    }
    U256::from(amount)
        .checked_mul(U256::exp10(decimals as usize))
        .ok_or_else(|| HexlinkError::invalid_input("amount overflows uint256"))
}

/// Scale a decimal string such as `"0.05"` by `10^decimals`. Negative amounts
/// are rejected; fractional digits beyond `decimals` are truncated.
pub fn parse_amount(amount: &str, decimals: u8) -> HexlinkResult<U256> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(HexlinkError::invalid_input(format!("invalid amount: {:?}", amount)));
    }
    if decimals > MAX_DECIMALS {
        return Err(HexlinkError::invalid_input(format!("decimals out of range: {}", decimals)));
    }
    Ok(parse_units(amount, decimals as u32)?.into())
}
