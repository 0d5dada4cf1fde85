/// Multi-payment phased sale
///
/// Buyers invest native coin or an accepted ERC-20 into an explicitly
/// activated phase. The purchase only records entitlement; tokens move at
/// claim time, after the owner finalizes the sale. Whatever the deadline
/// leaves unclaimed goes back to the owner through the sweep.
///
/// Payment legs: the buyer's tendered native value is credited to the
/// campaign before the operation runs, and the overpayment beyond the
/// recomputed cost is refunded in the same currency. Token payments are
/// pulled at exactly the recomputed cost, so the tendered difference never
/// leaves the buyer's wallet; the purchase event still reports it as the
/// refund.
use alloy_primitives::{Address, U256};
use tracing::info;

use crate::config::PaymentCurrencies;
use crate::error::Error;
use crate::events::Event;
use crate::ledger::{Currency, Ledger};
use crate::lifecycle::RejectReason;
use crate::math;

use super::{Campaign, Settlement};

impl Campaign {
    /// Invest `paid` native value into `phase`, aborting if the clamped
    /// allocation falls below `min_tokens`.
    pub fn invest_native(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        phase: u32,
        paid: U256,
        min_tokens: U256,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.invest_inner(ledger, now, sender, phase, Currency::Native, paid, min_tokens)
        })
    }

    /// Invest `tendered` units of an accepted payment token into `phase`.
    #[allow(clippy::too_many_arguments)]
    pub fn invest_token(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        phase: u32,
        token: Address,
        tendered: U256,
        min_tokens: U256,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.invest_inner(
                ledger,
                now,
                sender,
                phase,
                Currency::Token(token),
                tendered,
                min_tokens,
            )
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn invest_inner(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        phase_index: u32,
        currency: Currency,
        tendered: U256,
        min_tokens: U256,
    ) -> Result<Settlement, Error> {
        let params = self.phased_params()?.clone();
        self.ensure_not_paused()?;
        self.ensure_not_blacklisted(sender)?;
        self.gate.admit(now)?;

        if tendered.is_zero() {
            return Err(Error::InvalidInput(
                "tendered payment must be non-zero".to_string(),
            ));
        }

        if matches!(currency, Currency::Token(_))
            && matches!(self.config.currencies, PaymentCurrencies::NativeOnly)
        {
            return Err(Error::InvalidInput(
                "sale accepts native payment only".to_string(),
            ));
        }

        let phase = self
            .phases
            .get(phase_index as usize)
            .ok_or_else(|| Error::InvalidInput("unknown phase".to_string()))?;
        if !phase.active {
            return Err(Error::Lifecycle(RejectReason::Inactive));
        }
        let price = match currency {
            Currency::Native => phase.price_native,
            Currency::Token(token) => phase
                .price_by_token
                .get(&token)
                .copied()
                .unwrap_or(U256::ZERO),
        };
        if price.is_zero() {
            return Err(Error::InvalidInput(
                "phase has no price for this payment currency".to_string(),
            ));
        }

        let unit = math::pow10(params.sale_token_decimals)?;
        let possible = math::mul_div_floor(tendered, unit, price)?;
        let remaining = phase.remaining();
        let tokens = possible.min(remaining);
        if tokens.is_zero() {
            return Err(Error::CapacityExceeded);
        }
        if tokens < min_tokens {
            return Err(Error::SlippageExceeded);
        }
        // cost recomputed from the clamped allocation, floored, so it can
        // never exceed the tendered payment
        let cost = math::mul_div_floor(tokens, price, unit)?;
        let refund = tendered.checked_sub(cost).ok_or(Error::Overflow)?;

        let new_total = Self::charge_cap(
            self.total_sold,
            tokens,
            self.config.supply_cap,
            Error::SupplyExhausted,
        )?;

        // effects
        self.total_sold = new_total;
        match currency {
            Currency::Native => {
                self.raised_native = self
                    .raised_native
                    .checked_add(cost)
                    .ok_or(Error::Overflow)?;
            }
            Currency::Token(token) => {
                let raised = self.raised_by_token.entry(token).or_default();
                *raised = raised.checked_add(cost).ok_or(Error::Overflow)?;
            }
        }
        {
            let phase = &mut self.phases[phase_index as usize];
            phase.sold = phase.sold.checked_add(tokens).ok_or(Error::Overflow)?;
        }
        let participant = self.participants.entry(sender).or_default();
        participant.purchased = participant
            .purchased
            .checked_add(tokens)
            .ok_or(Error::Overflow)?;
        self.emit(Event::Purchased {
            buyer: sender,
            phase: Some(phase_index),
            currency,
            tendered,
            cost,
            tokens,
            refund,
        });
        info!(buyer = %sender, phase = phase_index, %tendered, %cost, %tokens, "phased investment");

        // interactions
        let mut settlement = Settlement {
            granted: tokens,
            transfers: Vec::new(),
        };
        match currency {
            Currency::Native => {
                if refund > U256::ZERO {
                    ledger.send_native(self.address, sender, refund)?;
                    settlement.push(Currency::Native, sender, refund);
                }
            }
            Currency::Token(token) => {
                ledger.transfer_from(token, sender, self.address, cost)?;
            }
        }
        Ok(settlement)
    }

    /// One-way close of the sale. Requires the campaign to hold at least the
    /// sold amount, opens the claim window (`claim_period` seconds, or the
    /// configured default) and deactivates every phase.
    pub fn finalize(
        &mut self,
        ledger: &mut dyn Ledger,
        caller: Address,
        now: u64,
        claim_period: Option<u64>,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let params = c.phased_params()?.clone();
            if c.gate.is_finalized() {
                return Err(Error::Lifecycle(RejectReason::Finalized));
            }
            if ledger.balance_of(c.config.sale_token, c.address)? < c.total_sold {
                return Err(Error::InsufficientFunds);
            }
            c.gate.finalize()?;
            let period = claim_period.unwrap_or(params.default_claim_period);
            c.claim_deadline = now.checked_add(period).ok_or(Error::Overflow)?;
            for phase in &mut c.phases {
                phase.active = false;
            }
            let deadline = c.claim_deadline;
            let total_sold = c.total_sold;
            c.emit(Event::Finalized {
                total_sold,
                claim_deadline: deadline,
            });
            info!(%total_sold, deadline, "sale finalized");
            Ok(())
        })
    }

    /// Pay out the sender's recorded entitlement. Only valid while the sale
    /// is finalized and the claim window is open; the entitlement is zeroed,
    /// so a replay fails with `NothingToClaim`.
    pub fn claim_tokens(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.phased_params()?;
            c.ensure_not_paused()?;
            c.ensure_not_blacklisted(sender)?;
            if !c.gate.is_finalized() {
                return Err(Error::Lifecycle(RejectReason::NotFinalized));
            }
            if now > c.claim_deadline {
                return Err(Error::Lifecycle(RejectReason::ClaimWindowClosed));
            }
            let amount = c.purchased_of(sender);
            if amount.is_zero() {
                return Err(Error::NothingToClaim);
            }

            // effects: zero the entitlement before the transfer
            if let Some(p) = c.participants.get_mut(&sender) {
                p.purchased = U256::ZERO;
                p.claimed = true;
            }
            c.emit(Event::TokensClaimed {
                claimant: sender,
                amount,
            });
            info!(claimant = %sender, %amount, "entitlement claimed");

            // interactions
            ledger.transfer(c.config.sale_token, c.address, sender, amount)?;
            let mut settlement = Settlement {
                granted: amount,
                transfers: Vec::new(),
            };
            settlement.push(Currency::Token(c.config.sale_token), sender, amount);
            Ok(settlement)
        })
    }

    /// Reclaim whatever sale-token balance is left once the claim window has
    /// closed.
    pub fn sweep(
        &mut self,
        ledger: &mut dyn Ledger,
        caller: Address,
        now: u64,
        to: Address,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.phased_params()?;
            if to == Address::ZERO {
                return Err(Error::InvalidInput(
                    "recipient must be non-zero".to_string(),
                ));
            }
            if !c.gate.is_finalized() {
                return Err(Error::Lifecycle(RejectReason::NotFinalized));
            }
            if now <= c.claim_deadline {
                return Err(Error::Lifecycle(RejectReason::ClaimWindowOpen));
            }
            let amount = ledger.balance_of(c.config.sale_token, c.address)?;
            if amount.is_zero() {
                return Err(Error::NothingToClaim);
            }
            c.emit(Event::Swept { to, amount });
            info!(%to, %amount, "remainder swept");

            ledger.transfer(c.config.sale_token, c.address, to, amount)?;
            let mut settlement = Settlement {
                granted: U256::ZERO,
                transfers: Vec::new(),
            };
            settlement.push(Currency::Token(c.config.sale_token), to, amount);
            Ok(settlement)
        })
    }
}
