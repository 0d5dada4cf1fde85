/// Tiered presale purchases
///
/// Tiers are consumed strictly front to back. A purchase converts the
/// tendered native value at the current tier's price, is clamped to the
/// tier's remaining capacity, and advances the tier pointer once the tier is
/// fully consumed. The pointer only ever moves forward.
///
/// This sale keeps the full tendered value even when the allocation is
/// clamped (no refund of the excess) unless `refund_excess` is configured;
/// the recorded raise reflects whichever behavior is active.
use alloy_primitives::{Address, U256};
use tracing::info;

use crate::config::DistributionModel;
use crate::error::Error;
use crate::events::Event;
use crate::ledger::{Currency, Ledger};
use crate::math;

use super::{Campaign, Settlement};

impl Campaign {
    pub(super) fn purchase_tiered_inner(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        paid: U256,
    ) -> Result<Settlement, Error> {
        let params = match &self.config.model {
            DistributionModel::TieredPresale(p) => p.clone(),
            _ => {
                return Err(Error::InvalidInput(
                    "operation is only available on tiered presales".to_string(),
                ))
            }
        };
        self.ensure_not_paused()?;
        self.ensure_not_blacklisted(sender)?;
        self.gate.admit(now)?;

        if paid.is_zero() {
            return Err(Error::InvalidInput("paid value must be non-zero".to_string()));
        }

        let tier_index = self.current_tier;
        let (price, remaining) = match self.phases.get(tier_index) {
            // every earlier tier is consumed, so an out-of-range pointer
            // means the whole allocation is gone
            None => return Err(Error::SupplyExhausted),
            Some(tier) => (tier.price_native, tier.remaining()),
        };
        // zero price is the exhaustion sentinel for a tier
        if price.is_zero() {
            return Err(Error::SupplyExhausted);
        }

        let wanted = math::mul_div_floor(paid, math::pow10(18)?, price)?;
        if wanted.is_zero() {
            return Err(Error::InvalidInput(
                "paid value converts to zero tokens".to_string(),
            ));
        }
        let tokens = wanted.min(remaining);
        if tokens.is_zero() {
            return Err(Error::CapacityExceeded);
        }

        let (cost, refund) = if params.refund_excess && tokens < wanted {
            let cost = math::mul_div_floor(tokens, price, math::pow10(18)?)?;
            let refund = paid.checked_sub(cost).ok_or(Error::Overflow)?;
            (cost, refund)
        } else {
            (paid, U256::ZERO)
        };

        let new_total = Self::charge_cap(
            self.total_sold,
            tokens,
            self.config.supply_cap,
            Error::SupplyExhausted,
        )?;
        if ledger.balance_of(self.config.sale_token, self.address)? < tokens {
            return Err(Error::InsufficientFunds);
        }

        // effects
        self.total_sold = new_total;
        self.raised_native = self.raised_native.checked_add(cost).ok_or(Error::Overflow)?;
        {
            let tier = &mut self.phases[tier_index];
            tier.sold = tier.sold.checked_add(tokens).ok_or(Error::Overflow)?;
        }
        let participant = self.participants.entry(sender).or_default();
        participant.purchased = participant
            .purchased
            .checked_add(tokens)
            .ok_or(Error::Overflow)?;
        if self.phases[tier_index].is_exhausted() {
            self.current_tier += 1;
            self.emit(Event::TierAdvanced {
                tier: self.current_tier as u32,
            });
        }
        self.emit(Event::Purchased {
            buyer: sender,
            phase: Some(tier_index as u32),
            currency: Currency::Native,
            tendered: paid,
            cost,
            tokens,
            refund,
        });
        info!(buyer = %sender, tier = tier_index, %paid, %tokens, %refund, "tiered purchase");

        // interactions
        let mut settlement = Settlement {
            granted: tokens,
            transfers: Vec::new(),
        };
        ledger.transfer(self.config.sale_token, self.address, sender, tokens)?;
        settlement.push(Currency::Token(self.config.sale_token), sender, tokens);
        if refund > U256::ZERO {
            ledger.send_native(self.address, sender, refund)?;
            settlement.push(Currency::Native, sender, refund);
        }
        Ok(settlement)
    }
}
