/// Fixed-price presale purchases
///
/// Admission is the timestamp window; the purchase converts the tendered
/// native value at a constant 18-decimal rate and transfers the tokens in
/// the same operation. Proceeds accumulate on the campaign account until
/// the owner withdraws them.
use alloy_primitives::{Address, U256};
use tracing::info;

use crate::config::DistributionModel;
use crate::error::Error;
use crate::events::Event;
use crate::ledger::{Currency, Ledger};
use crate::math;

use super::{Campaign, Settlement};

impl Campaign {
    /// Buy at the configured rate with `paid` native value (already credited
    /// to the campaign account by the host, like any value transfer).
    /// Dispatches to the tiered path on tiered campaigns.
    pub fn purchase(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        paid: U256,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| match &c.config.model {
            DistributionModel::FixedPresale(_) => c.purchase_fixed_inner(ledger, now, sender, paid),
            DistributionModel::TieredPresale(_) => {
                c.purchase_tiered_inner(ledger, now, sender, paid)
            }
            _ => Err(Error::InvalidInput(
                "operation is only available on presale campaigns".to_string(),
            )),
        })
    }

    fn purchase_fixed_inner(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        paid: U256,
    ) -> Result<Settlement, Error> {
        let params = match &self.config.model {
            DistributionModel::FixedPresale(p) => p.clone(),
            _ => {
                return Err(Error::InvalidInput(
                    "operation is only available on fixed-price presales".to_string(),
                ))
            }
        };
        self.ensure_not_paused()?;
        self.ensure_not_blacklisted(sender)?;
        self.gate.admit(now)?;

        if paid < params.min_buy || paid > params.max_buy {
            return Err(Error::InvalidInput(
                "paid value outside the purchase bounds".to_string(),
            ));
        }

        let scaled_rate = params
            .rate
            .checked_mul(math::pow10(params.token_decimals)?)
            .ok_or(Error::Overflow)?;
        let tokens = math::mul_div_floor(paid, scaled_rate, math::pow10(18)?)?;
        if tokens.is_zero() {
            return Err(Error::InvalidInput(
                "paid value converts to zero tokens".to_string(),
            ));
        }

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
        self.raised_native = self
            .raised_native
            .checked_add(paid)
            .ok_or(Error::Overflow)?;
        let participant = self.participants.entry(sender).or_default();
        participant.purchased = participant
            .purchased
            .checked_add(tokens)
            .ok_or(Error::Overflow)?;
        self.emit(Event::Purchased {
            buyer: sender,
            phase: None,
            currency: Currency::Native,
            tendered: paid,
            cost: paid,
            tokens,
            refund: U256::ZERO,
        });
        info!(buyer = %sender, %paid, %tokens, "fixed-price purchase");

        // interactions
        ledger.transfer(self.config.sale_token, self.address, sender, tokens)?;
        let mut settlement = Settlement {
            granted: tokens,
            transfers: Vec::new(),
        };
        settlement.push(Currency::Token(self.config.sale_token), sender, tokens);
        Ok(settlement)
    }
}
