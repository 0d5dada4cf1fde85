/// Campaign aggregate
///
/// One `Campaign` instance models one deployed distribution contract. It owns
/// all allocation and eligibility state, decides how many units each admitted
/// request may be granted, and settles the resulting transfers against the
/// [`Ledger`] capability, mutating state strictly before interactions and
/// holding a reentrancy latch for the whole operation.
///
/// The five production variants are exposed as constructor presets:
/// [`Campaign::flat_airdrop`], [`Campaign::merkle_airdrop`],
/// [`Campaign::fixed_presale`], [`Campaign::tiered_presale`] and
/// [`Campaign::phased_sale`].
pub mod airdrop;
pub mod fixed;
pub mod phased;
pub mod tiered;

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{
    AirdropParams, CampaignConfig, DistributionModel, FeeAccounting, FixedPresaleParams,
    PaymentCurrencies, Phase, PhaseParams, PhasedSaleParams, ReferralRule, SettlementModel,
    TierUpdate, TieredPresaleParams,
};
use crate::error::Error;
use crate::events::Event;
use crate::ledger::{Currency, Ledger};
use crate::lifecycle::{LifecycleGate, RejectReason, ScheduleModel, TierProposal};

/// Per-address claim/purchase record. Created on first successful operation,
/// never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// One-way claim latch; never unset once set.
    pub claimed: bool,
    /// Recorded entitlement (deferred model) or cumulative purchase.
    pub purchased: U256,
    /// Referrals credited to this address (self-claimed rule only).
    pub referral_count: u32,
}

/// One transfer the operation settled (or instructed the host to settle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub currency: Currency,
    pub to: Address,
    pub amount: U256,
}

/// Outcome of a successful ledger-mutating operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Allocation granted to the requesting participant, in sale-token units.
    pub granted: U256,
    /// Every transfer issued by the operation, in issue order.
    pub transfers: Vec<TransferInstruction>,
}

impl Settlement {
    fn push(&mut self, currency: Currency, to: Address, amount: U256) {
        self.transfers.push(TransferInstruction {
            currency,
            to,
            amount,
        });
    }
}

pub struct Campaign {
    address: Address,
    owner: Address,
    paused: bool,
    entered: bool,
    gate: LifecycleGate,
    config: CampaignConfig,
    phases: Vec<Phase>,
    current_tier: usize,
    participants: HashMap<Address, Participant>,
    blacklist: HashSet<Address>,
    total_distributed: U256,
    total_sold: U256,
    raised_native: U256,
    raised_by_token: HashMap<Address, U256>,
    claim_deadline: u64,
    proposal: TierProposal,
    events: Vec<Event>,
}

impl Campaign {
    /// Build a campaign from an explicit configuration. The presets below are
    /// the supported combinations; this constructor only enforces internal
    /// consistency.
    pub fn with_config(
        address: Address,
        owner: Address,
        config: CampaignConfig,
        phases: Vec<PhaseParams>,
    ) -> Result<Self, Error> {
        if address == Address::ZERO {
            return Err(Error::InvalidInput(
                "campaign address must be non-zero".to_string(),
            ));
        }
        if owner == Address::ZERO {
            return Err(Error::InvalidInput(
                "owner address must be non-zero".to_string(),
            ));
        }
        config.validate()?;

        let gate = match config.schedule {
            ScheduleModel::ExplicitFlag => LifecycleGate::flag(),
            ScheduleModel::TimeWindow { start, stop } => LifecycleGate::window(start, stop)?,
        };
        let (tiered_active, proposal_delay) = match &config.model {
            DistributionModel::TieredPresale(p) => (true, p.proposal_delay),
            _ => (false, 0),
        };
        let mut built = Vec::with_capacity(phases.len());
        for params in phases {
            params.validate()?;
            built.push(params.into_phase(tiered_active));
        }

        Ok(Self {
            address,
            owner,
            paused: false,
            entered: false,
            gate,
            config,
            phases: built,
            current_tier: 0,
            participants: HashMap::new(),
            blacklist: HashSet::new(),
            total_distributed: U256::ZERO,
            total_sold: U256::ZERO,
            raised_native: U256::ZERO,
            raised_by_token: HashMap::new(),
            claim_deadline: 0,
            proposal: TierProposal::new(proposal_delay),
            events: Vec::new(),
        })
    }

    // ============ Variant presets ============

    /// Flat-amount airdrop with the self-claimed referral rule. The fee is
    /// charged from the gross amount but only net + referral bonus count
    /// against the supply cap.
    #[allow(clippy::too_many_arguments)]
    pub fn flat_airdrop(
        address: Address,
        owner: Address,
        sale_token: Address,
        supply_cap: U256,
        main_amount: U256,
        fee_percent: u8,
        fee_recipient: Address,
        referral_bonus: U256,
        max_referrals: u32,
    ) -> Result<Self, Error> {
        let config = CampaignConfig {
            sale_token,
            supply_cap,
            schedule: ScheduleModel::ExplicitFlag,
            settlement: SettlementModel::Immediate,
            currencies: PaymentCurrencies::NativeOnly,
            model: DistributionModel::Airdrop(AirdropParams {
                main_amount,
                fee_percent,
                fee_recipient,
                referral_bonus,
                referral: ReferralRule::SelfClaimed { max_referrals },
                fee_accounting: FeeAccounting::NetOnly,
                merkle_root: None,
            }),
        };
        Self::with_config(address, owner, config, Vec::new())
    }

    /// Flat-amount airdrop whose referrers are whitelisted under a Merkle
    /// root. Gross amounts (fee included) count against the supply cap.
    #[allow(clippy::too_many_arguments)]
    pub fn merkle_airdrop(
        address: Address,
        owner: Address,
        sale_token: Address,
        supply_cap: U256,
        main_amount: U256,
        fee_percent: u8,
        fee_recipient: Address,
        referral_bonus: U256,
        merkle_root: B256,
    ) -> Result<Self, Error> {
        let config = CampaignConfig {
            sale_token,
            supply_cap,
            schedule: ScheduleModel::ExplicitFlag,
            settlement: SettlementModel::Immediate,
            currencies: PaymentCurrencies::NativeOnly,
            model: DistributionModel::Airdrop(AirdropParams {
                main_amount,
                fee_percent,
                fee_recipient,
                referral_bonus,
                referral: ReferralRule::MerkleProof,
                fee_accounting: FeeAccounting::GrossInCap,
                merkle_root: Some(merkle_root),
            }),
        };
        Self::with_config(address, owner, config, Vec::new())
    }

    /// Fixed-price presale admitted by a timestamp window; tokens transfer
    /// inside the purchase.
    pub fn fixed_presale(
        address: Address,
        owner: Address,
        sale_token: Address,
        supply_cap: U256,
        params: FixedPresaleParams,
        start: u64,
        stop: u64,
    ) -> Result<Self, Error> {
        let config = CampaignConfig {
            sale_token,
            supply_cap,
            schedule: ScheduleModel::TimeWindow { start, stop },
            settlement: SettlementModel::Immediate,
            currencies: PaymentCurrencies::NativeOnly,
            model: DistributionModel::FixedPresale(params),
        };
        Self::with_config(address, owner, config, Vec::new())
    }

    /// Tiered presale: ordered tiers consumed front to back, owner-driven
    /// start/stop, two-step tier reconfiguration.
    pub fn tiered_presale(
        address: Address,
        owner: Address,
        sale_token: Address,
        supply_cap: U256,
        params: TieredPresaleParams,
        tiers: Vec<PhaseParams>,
    ) -> Result<Self, Error> {
        if tiers.is_empty() {
            return Err(Error::InvalidInput(
                "tiered presale needs at least one tier".to_string(),
            ));
        }
        let config = CampaignConfig {
            sale_token,
            supply_cap,
            schedule: ScheduleModel::ExplicitFlag,
            settlement: SettlementModel::Immediate,
            currencies: PaymentCurrencies::NativeOnly,
            model: DistributionModel::TieredPresale(params),
        };
        Self::with_config(address, owner, config, tiers)
    }

    /// Multi-payment phased sale with deferred claims and the
    /// finalize → claim → sweep lifecycle. Phases start inactive.
    pub fn phased_sale(
        address: Address,
        owner: Address,
        sale_token: Address,
        supply_cap: U256,
        params: PhasedSaleParams,
        phases: Vec<PhaseParams>,
    ) -> Result<Self, Error> {
        let config = CampaignConfig {
            sale_token,
            supply_cap,
            schedule: ScheduleModel::ExplicitFlag,
            settlement: SettlementModel::DeferredClaim,
            currencies: PaymentCurrencies::NativeAndTokens,
            model: DistributionModel::PhasedSale(params),
        };
        Self::with_config(address, owner, config, phases)
    }

    // ============ Views ============

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_blacklisted(&self, address: Address) -> bool {
        self.blacklist.contains(&address)
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn schedule(&self) -> ScheduleModel {
        self.gate.schedule()
    }

    pub fn is_open(&self, now: u64) -> bool {
        self.gate.is_open(now)
    }

    pub fn is_finalized(&self) -> bool {
        self.gate.is_finalized()
    }

    pub fn claim_deadline(&self) -> u64 {
        self.claim_deadline
    }

    pub fn participant(&self, address: Address) -> Option<&Participant> {
        self.participants.get(&address)
    }

    pub fn has_claimed(&self, address: Address) -> bool {
        self.participants
            .get(&address)
            .map_or(false, |p| p.claimed)
    }

    pub fn purchased_of(&self, address: Address) -> U256 {
        self.participants
            .get(&address)
            .map(|p| p.purchased)
            .unwrap_or_default()
    }

    pub fn referral_count_of(&self, address: Address) -> u32 {
        self.participants
            .get(&address)
            .map(|p| p.referral_count)
            .unwrap_or_default()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, index: u32) -> Option<&Phase> {
        self.phases.get(index as usize)
    }

    /// Index of the tier currently being consumed (tiered model). Equals the
    /// phase count once every tier is exhausted; monotonically non-decreasing.
    pub fn current_tier(&self) -> usize {
        self.current_tier
    }

    pub fn supply_cap(&self) -> U256 {
        self.config.supply_cap
    }

    pub fn total_distributed(&self) -> U256 {
        self.total_distributed
    }

    pub fn total_sold(&self) -> U256 {
        self.total_sold
    }

    pub fn raised_native(&self) -> U256 {
        self.raised_native
    }

    pub fn raised_in_token(&self, token: Address) -> U256 {
        self.raised_by_token
            .get(&token)
            .copied()
            .unwrap_or_default()
    }

    pub fn tier_proposal(&self) -> &TierProposal {
        &self.proposal
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ============ Ownership, pause, blacklist ============

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if new_owner == Address::ZERO {
                return Err(Error::InvalidInput(
                    "new owner must be non-zero".to_string(),
                ));
            }
            let previous = c.owner;
            c.owner = new_owner;
            c.emit(Event::OwnershipTransferred {
                previous,
                new: new_owner,
            });
            Ok(())
        })
    }

    pub fn pause(&mut self, caller: Address) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if c.paused {
                return Err(Error::InvalidInput("already paused".to_string()));
            }
            c.paused = true;
            c.emit(Event::Paused { by: caller });
            Ok(())
        })
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if !c.paused {
                return Err(Error::InvalidInput("not paused".to_string()));
            }
            c.paused = false;
            c.emit(Event::Unpaused { by: caller });
            Ok(())
        })
    }

    pub fn set_blacklisted(
        &mut self,
        caller: Address,
        address: Address,
        blocked: bool,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if address == Address::ZERO {
                return Err(Error::InvalidInput("address must be non-zero".to_string()));
            }
            if blocked {
                c.blacklist.insert(address);
            } else {
                c.blacklist.remove(&address);
            }
            c.emit(Event::BlacklistUpdated { address, blocked });
            Ok(())
        })
    }

    // ============ Schedule ============

    pub fn start_sale(&mut self, caller: Address) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.gate.start()?;
            c.emit(Event::SaleStarted);
            Ok(())
        })
    }

    pub fn stop_sale(&mut self, caller: Address) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.gate.stop()?;
            c.emit(Event::SaleStopped);
            Ok(())
        })
    }

    pub fn set_window(&mut self, caller: Address, start: u64, stop: u64) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.gate.set_window(start, stop)?;
            c.emit(Event::ScheduleUpdated { start, stop });
            Ok(())
        })
    }

    // ============ Parameter updates ============

    pub fn set_fee(
        &mut self,
        caller: Address,
        percent: u8,
        recipient: Address,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if percent > 100 {
                return Err(Error::InvalidInput(
                    "fee percent must be at most 100".to_string(),
                ));
            }
            if percent > 0 && recipient == Address::ZERO {
                return Err(Error::InvalidInput(
                    "fee recipient must be set when a fee is charged".to_string(),
                ));
            }
            let params = c.airdrop_params_mut()?;
            params.fee_percent = percent;
            params.fee_recipient = recipient;
            c.emit(Event::FeeUpdated { percent, recipient });
            Ok(())
        })
    }

    pub fn set_airdrop_amount(&mut self, caller: Address, amount: U256) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if amount.is_zero() {
                return Err(Error::InvalidInput(
                    "main amount must be non-zero".to_string(),
                ));
            }
            c.airdrop_params_mut()?.main_amount = amount;
            c.emit(Event::AirdropAmountUpdated { amount });
            Ok(())
        })
    }

    pub fn set_referral_config(
        &mut self,
        caller: Address,
        bonus: U256,
        max_referrals: u32,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let params = c.airdrop_params_mut()?;
            params.referral_bonus = bonus;
            if let ReferralRule::SelfClaimed { max_referrals: cap } = &mut params.referral {
                *cap = max_referrals;
            }
            c.emit(Event::ReferralConfigUpdated {
                bonus,
                max_referrals,
            });
            Ok(())
        })
    }

    pub fn set_merkle_root(&mut self, caller: Address, root: B256) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let params = c.airdrop_params_mut()?;
            if !matches!(params.referral, ReferralRule::MerkleProof) {
                return Err(Error::InvalidInput(
                    "campaign does not verify referrers by proof".to_string(),
                ));
            }
            params.merkle_root = Some(root);
            c.emit(Event::MerkleRootUpdated { root });
            Ok(())
        })
    }

    pub fn set_supply_cap(&mut self, caller: Address, cap: U256) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if cap.is_zero() {
                return Err(Error::InvalidInput(
                    "supply cap must be non-zero".to_string(),
                ));
            }
            let floor = c.total_distributed.max(c.total_sold);
            if cap < floor {
                return Err(Error::InvalidInput(
                    "supply cap cannot undercut amounts already granted".to_string(),
                ));
            }
            c.config.supply_cap = cap;
            c.emit(Event::SupplyCapUpdated { cap });
            Ok(())
        })
    }

    // ============ Phase administration ============

    pub fn add_phase(&mut self, caller: Address, params: PhaseParams) -> Result<u32, Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let tiered = match c.config.model {
                DistributionModel::TieredPresale(_) => true,
                DistributionModel::PhasedSale(_) => false,
                _ => {
                    return Err(Error::InvalidInput(
                        "campaign has no phases".to_string(),
                    ))
                }
            };
            params.validate()?;
            let index = c.phases.len() as u32;
            let capacity = params.capacity;
            let price_native = params.price_native;
            c.phases.push(params.into_phase(tiered));
            c.emit(Event::PhaseAdded {
                phase: index,
                capacity,
                price_native,
            });
            Ok(index)
        })
    }

    pub fn set_phase_active(
        &mut self,
        caller: Address,
        index: u32,
        active: bool,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if c.gate.is_finalized() {
                return Err(Error::Lifecycle(RejectReason::Finalized));
            }
            let phase = c
                .phases
                .get_mut(index as usize)
                .ok_or_else(|| Error::InvalidInput("unknown phase".to_string()))?;
            phase.active = active;
            c.emit(Event::PhaseActiveSet {
                phase: index,
                active,
            });
            Ok(())
        })
    }

    /// Raise (or re-set) a phase's capacity. The new value may never undercut
    /// what the phase has already sold.
    pub fn set_phase_capacity(
        &mut self,
        caller: Address,
        index: u32,
        capacity: U256,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let phase = c
                .phases
                .get_mut(index as usize)
                .ok_or_else(|| Error::InvalidInput("unknown phase".to_string()))?;
            if capacity < phase.sold {
                return Err(Error::InvalidInput(
                    "capacity cannot undercut amount already sold".to_string(),
                ));
            }
            phase.capacity = capacity;
            c.emit(Event::PhaseCapacityUpdated {
                phase: index,
                capacity,
            });
            Ok(())
        })
    }

    pub fn set_phase_price(
        &mut self,
        caller: Address,
        index: u32,
        currency: Currency,
        price: U256,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            let phase = c
                .phases
                .get_mut(index as usize)
                .ok_or_else(|| Error::InvalidInput("unknown phase".to_string()))?;
            match currency {
                Currency::Native => phase.price_native = price,
                Currency::Token(token) => {
                    if token == Address::ZERO {
                        return Err(Error::InvalidInput(
                            "payment token address must be non-zero".to_string(),
                        ));
                    }
                    if price.is_zero() {
                        phase.price_by_token.remove(&token);
                    } else {
                        phase.price_by_token.insert(token, price);
                    }
                }
            }
            c.emit(Event::PriceUpdated {
                phase: index,
                currency,
                price,
            });
            Ok(())
        })
    }

    // ============ Two-step tier reconfiguration ============

    /// Stage a tier update. Overwrites any prior unapplied proposal and
    /// restarts the commit delay.
    pub fn propose_tiers(
        &mut self,
        caller: Address,
        now: u64,
        updates: Vec<TierUpdate>,
    ) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.tiered_params()?;
            for update in &updates {
                if update.capacity.is_zero() {
                    return Err(Error::InvalidInput(
                        "staged tier capacity must be non-zero".to_string(),
                    ));
                }
            }
            let count = updates.len() as u32;
            c.proposal.propose(updates, now);
            c.emit(Event::TiersProposed {
                tiers: count,
                proposed_at: now,
            });
            Ok(())
        })
    }

    /// Promote the staged tiers once the delay has elapsed. Every staged
    /// entry is applied atomically: entries addressing existing tiers update
    /// price and capacity in place, extra entries append new tiers.
    pub fn commit_tiers(&mut self, caller: Address, now: u64) -> Result<(), Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            c.tiered_params()?;
            if !c.proposal.is_pending() {
                // nothing staged: iterate zero entries
                return Ok(());
            }
            if !c.proposal.is_ready(now) {
                return Err(Error::Lifecycle(RejectReason::DelayNotElapsed));
            }
            // validate the whole batch before the staging area is consumed,
            // so a rejected commit leaves both tiers and proposal untouched
            for (i, update) in c.proposal.staged().iter().enumerate() {
                if let Some(phase) = c.phases.get(i) {
                    if update.capacity < phase.sold {
                        return Err(Error::InvalidInput(
                            "staged capacity cannot undercut amount already sold".to_string(),
                        ));
                    }
                }
            }
            let updates = c.proposal.commit(now)?;
            let count = updates.len() as u32;
            for (i, update) in updates.into_iter().enumerate() {
                if i < c.phases.len() {
                    let phase = &mut c.phases[i];
                    phase.price_native = update.price_native;
                    phase.capacity = update.capacity;
                } else {
                    c.phases.push(Phase {
                        capacity: update.capacity,
                        sold: U256::ZERO,
                        active: true,
                        price_native: update.price_native,
                        price_by_token: HashMap::new(),
                    });
                }
            }
            c.emit(Event::TiersCommitted { tiers: count });
            Ok(())
        })
    }

    // ============ Owner withdrawals ============

    /// Withdraw every raised payment balance (native plus each payment
    /// token) to `to`.
    pub fn withdraw_raised(
        &mut self,
        ledger: &mut dyn Ledger,
        caller: Address,
        to: Address,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if to == Address::ZERO {
                return Err(Error::InvalidInput(
                    "recipient must be non-zero".to_string(),
                ));
            }
            let mut settlement = Settlement::default();
            let native = ledger.native_balance_of(c.address)?;
            let mut tokens: Vec<Address> = c.raised_by_token.keys().copied().collect();
            tokens.sort();

            // effects: none beyond the event stream; raised totals are
            // cumulative counters, not balances
            if native > U256::ZERO {
                c.emit(Event::FundsWithdrawn {
                    to,
                    currency: Currency::Native,
                    amount: native,
                });
            }
            let mut token_amounts = Vec::with_capacity(tokens.len());
            for token in &tokens {
                let amount = ledger.balance_of(*token, c.address)?;
                if amount > U256::ZERO {
                    c.emit(Event::FundsWithdrawn {
                        to,
                        currency: Currency::Token(*token),
                        amount,
                    });
                }
                token_amounts.push(amount);
            }

            // interactions
            if native > U256::ZERO {
                ledger.send_native(c.address, to, native)?;
                settlement.push(Currency::Native, to, native);
            }
            for (token, amount) in tokens.into_iter().zip(token_amounts) {
                if amount > U256::ZERO {
                    ledger.transfer(token, c.address, to, amount)?;
                    settlement.push(Currency::Token(token), to, amount);
                }
            }
            Ok(settlement)
        })
    }

    /// Withdraw unsold sale tokens held by the campaign. Blocked once a
    /// phased sale is finalized: from then on the balance backs recorded
    /// entitlements and is only reachable through `sweep` after the deadline.
    pub fn withdraw_unsold(
        &mut self,
        ledger: &mut dyn Ledger,
        caller: Address,
        to: Address,
        amount: Option<U256>,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.ensure_owner(caller)?;
            if to == Address::ZERO {
                return Err(Error::InvalidInput(
                    "recipient must be non-zero".to_string(),
                ));
            }
            if c.gate.is_finalized() {
                return Err(Error::Lifecycle(RejectReason::Finalized));
            }
            let balance = ledger.balance_of(c.config.sale_token, c.address)?;
            let amount = amount.unwrap_or(balance);
            if amount.is_zero() {
                return Err(Error::NothingToClaim);
            }
            if amount > balance {
                return Err(Error::InsufficientFunds);
            }
            c.emit(Event::FundsWithdrawn {
                to,
                currency: Currency::Token(c.config.sale_token),
                amount,
            });
            ledger.transfer(c.config.sale_token, c.address, to, amount)?;
            let mut settlement = Settlement::default();
            settlement.push(Currency::Token(c.config.sale_token), to, amount);
            Ok(settlement)
        })
    }

    // ============ Internal plumbing ============

    /// Reentrancy latch around every state-mutating entry point: acquired on
    /// entry, released on every exit path, re-entry fails fast.
    fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.entered {
            return Err(Error::Reentrancy);
        }
        self.entered = true;
        let result = f(self);
        self.entered = false;
        result
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), Error> {
        if caller != self.owner {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> Result<(), Error> {
        if self.paused {
            return Err(Error::Lifecycle(RejectReason::Inactive));
        }
        Ok(())
    }

    fn ensure_not_blacklisted(&self, sender: Address) -> Result<(), Error> {
        if self.blacklist.contains(&sender) {
            return Err(Error::Blacklisted);
        }
        Ok(())
    }

    fn airdrop_params(&self) -> Result<&AirdropParams, Error> {
        match &self.config.model {
            DistributionModel::Airdrop(p) => Ok(p),
            _ => Err(Error::InvalidInput(
                "operation is only available on airdrop campaigns".to_string(),
            )),
        }
    }

    fn airdrop_params_mut(&mut self) -> Result<&mut AirdropParams, Error> {
        match &mut self.config.model {
            DistributionModel::Airdrop(p) => Ok(p),
            _ => Err(Error::InvalidInput(
                "operation is only available on airdrop campaigns".to_string(),
            )),
        }
    }

    fn tiered_params(&self) -> Result<&TieredPresaleParams, Error> {
        match &self.config.model {
            DistributionModel::TieredPresale(p) => Ok(p),
            _ => Err(Error::InvalidInput(
                "operation is only available on tiered presales".to_string(),
            )),
        }
    }

    fn phased_params(&self) -> Result<&PhasedSaleParams, Error> {
        match &self.config.model {
            DistributionModel::PhasedSale(p) => Ok(p),
            _ => Err(Error::InvalidInput(
                "operation is only available on phased sales".to_string(),
            )),
        }
    }

    fn emit(&mut self, event: Event) {
        debug!(?event, campaign = %self.address, "event");
        self.events.push(event);
    }

    /// Accrue to the running distribution/sale total while holding I1.
    fn charge_cap(
        total: U256,
        delta: U256,
        cap: U256,
        exhausted: Error,
    ) -> Result<U256, Error> {
        let next = total.checked_add(delta).ok_or(Error::Overflow)?;
        if next > cap {
            return Err(exhausted);
        }
        Ok(next)
    }
}
