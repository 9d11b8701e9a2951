//! # Fiat Conversion
//!
//! Exact integer conversion between smallest-unit chain amounts and cents.
//!
//! `cents = floor(amount * cents_per_unit / 10^decimals)`, computed in 512-bit
//! arithmetic so no product of a `U256` amount and a `u64` rate can overflow.
//! Because the result is floored, `cents >= required` holds exactly when the
//! unrounded value is `>= required`; no payment is rejected by rounding.

use crate::domain::errors::ConfigError;
use primitive_types::{U256, U512};
use shared_types::Address;
use std::collections::BTreeMap;

/// Decimals of the native coin.
pub const NATIVE_DECIMALS: u8 = 18;

/// Default native coin price: $2,200.00.
pub const DEFAULT_NATIVE_CENTS_PER_UNIT: u64 = 220_000;

/// Stablecoins are pegged 1:1 to the dollar.
pub const PEGGED_CENTS_PER_UNIT: u64 = 100;

/// Decimals assumed for a stablecoin configured without an explicit value.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Upper bound keeping `10^decimals` well inside 512 bits.
pub const MAX_DECIMALS: u8 = 77;

fn u512_to_u256(value: U512) -> Option<U256> {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    if bytes[..32].iter().any(|b| *b != 0) {
        return None;
    }
    Some(U256::from_big_endian(&bytes[32..]))
}

/// Fiat value of `amount` in whole cents, floored and saturated at `u64::MAX`.
pub fn to_cents(amount: U256, decimals: u8, cents_per_unit: u64) -> u64 {
    let product = U512::from(amount) * U512::from(cents_per_unit);
    let scale = U512::exp10(usize::from(decimals));
    let cents = product / scale;

    if cents > U512::from(u64::MAX) {
        u64::MAX
    } else {
        cents.low_u64()
    }
}

/// Smallest amount whose value is at least `cents`: `ceil(cents * 10^decimals / rate)`.
///
/// Returns `None` for a zero rate or when the amount does not fit in `U256`.
pub fn min_amount_for_cents(cents: u64, decimals: u8, cents_per_unit: u64) -> Option<U256> {
    if cents_per_unit == 0 {
        return None;
    }
    let numerator = U512::from(cents) * U512::exp10(usize::from(decimals));
    let rate = U512::from(cents_per_unit);
    let amount = (numerator + rate - U512::one()) / rate;
    u512_to_u256(amount)
}

/// How a token's amount is valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPricing {
    /// Native coin, valued through the rate source.
    Native { decimals: u8 },
    /// Allowlisted stablecoin, pegged at 100 cents per unit.
    Pegged { decimals: u8 },
}

impl TokenPricing {
    pub fn decimals(&self) -> u8 {
        match self {
            TokenPricing::Native { decimals } | TokenPricing::Pegged { decimals } => *decimals,
        }
    }
}

/// Accepted payment tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Decimals of the native coin (default 18).
    pub native_decimals: u8,
    /// Allowlisted stablecoins and their decimals.
    pub accepted_tokens: BTreeMap<Address, u8>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            native_decimals: NATIVE_DECIMALS,
            accepted_tokens: BTreeMap::new(),
        }
    }
}

impl ReconcilerConfig {
    /// Add a stablecoin to the allowlist.
    pub fn with_stablecoin(mut self, token: Address, decimals: u8) -> Self {
        self.accepted_tokens.insert(token, decimals);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.native_decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidDecimals {
                token: Address::NATIVE,
                decimals: self.native_decimals,
            });
        }
        for (token, decimals) in &self.accepted_tokens {
            if token.is_native() {
                return Err(ConfigError::NativeSentinelAsToken);
            }
            if *decimals > MAX_DECIMALS {
                return Err(ConfigError::InvalidDecimals {
                    token: *token,
                    decimals: *decimals,
                });
            }
        }
        Ok(())
    }

    /// Pricing rule for `token`, or `None` when it is neither native nor allowlisted.
    pub fn pricing_for(&self, token: &Address) -> Option<TokenPricing> {
        if token.is_native() {
            return Some(TokenPricing::Native {
                decimals: self.native_decimals,
            });
        }
        self.accepted_tokens
            .get(token)
            .map(|decimals| TokenPricing::Pegged {
                decimals: *decimals,
            })
    }
}
