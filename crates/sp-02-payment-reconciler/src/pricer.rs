//! Token valuation against the accepted-token configuration and rate source.

use crate::domain::{min_amount_for_cents, to_cents, ReconcilerConfig, TokenPricing, PEGGED_CENTS_PER_UNIT};
use crate::ports::RateSource;
use primitive_types::U256;
use shared_types::Address;
use std::sync::Arc;

/// Values chain amounts in cents and quotes the amount needed to cover a price.
pub struct PaymentPricer {
    config: ReconcilerConfig,
    rates: Arc<dyn RateSource>,
}

impl PaymentPricer {
    pub fn new(config: ReconcilerConfig, rates: Arc<dyn RateSource>) -> Self {
        Self { config, rates }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    fn rate_for(&self, pricing: TokenPricing) -> u64 {
        match pricing {
            TokenPricing::Native { .. } => self.rates.native_cents_per_unit(),
            TokenPricing::Pegged { .. } => PEGGED_CENTS_PER_UNIT,
        }
    }

    /// Fiat value of `amount` of `token`, or `None` for an unsupported token.
    pub fn value_in_cents(&self, token: &Address, amount: U256) -> Option<u64> {
        let pricing = self.config.pricing_for(token)?;
        Some(to_cents(amount, pricing.decimals(), self.rate_for(pricing)))
    }

    /// Smallest amount of `token` worth at least `cents`.
    pub fn quote(&self, token: &Address, cents: u64) -> Option<U256> {
        let pricing = self.config.pricing_for(token)?;
        min_amount_for_cents(cents, pricing.decimals(), self.rate_for(pricing))
    }

    /// Native sentinel followed by every allowlisted token.
    pub fn accepted_tokens(&self) -> Vec<Address> {
        std::iter::once(Address::NATIVE)
            .chain(self.config.accepted_tokens.keys().copied())
            .collect()
    }
}
