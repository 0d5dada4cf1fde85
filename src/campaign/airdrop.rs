/// Flat-amount airdrop claims
///
/// Each eligible address may claim the configured gross amount exactly once.
/// A fee percent is carved out of the gross for the fee recipient and an
/// optional referral bonus is paid on top, with referrer eligibility decided
/// by the configured rule. The claim latch is set before any transfer is
/// issued, and before the supply-cap check: an address whose claim dies on
/// the cap has spent its one shot and cannot retry.
use alloy_primitives::{Address, B256, U256};
use tracing::info;

use crate::config::{FeeAccounting, ReferralRule};
use crate::error::Error;
use crate::events::Event;
use crate::ledger::{Currency, Ledger};
use crate::math;
use crate::merkle::{leaf_for_address, MembershipProver};

use super::{Campaign, Settlement};

impl Campaign {
    /// Claim the airdrop for `sender`, optionally crediting a referrer.
    ///
    /// Referrer eligibility follows the campaign's rule: under
    /// `SelfClaimed` the referrer must have claimed already and stays under
    /// the per-address referral cap. Campaigns that verify referrers by
    /// membership proof must use [`Campaign::claim_with_proof`] instead when
    /// a referrer is supplied.
    ///
    /// A claim rejected with [`Error::SupplyExhausted`] still sets the
    /// sender's claim latch: one shot per address, not a retryable
    /// condition. Every other rejection leaves no observable effect.
    pub fn claim(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        referrer: Option<Address>,
    ) -> Result<Settlement, Error> {
        self.guarded(|c| c.claim_inner(ledger, now, sender, referrer, None))
    }

    /// Claim the airdrop crediting a Merkle-whitelisted referrer.
    pub fn claim_with_proof(
        &mut self,
        ledger: &mut dyn Ledger,
        prover: &dyn MembershipProver,
        now: u64,
        sender: Address,
        referrer: Address,
        proof: &[B256],
    ) -> Result<Settlement, Error> {
        self.guarded(|c| {
            c.claim_inner(ledger, now, sender, Some(referrer), Some((prover, proof)))
        })
    }

    fn claim_inner(
        &mut self,
        ledger: &mut dyn Ledger,
        now: u64,
        sender: Address,
        referrer: Option<Address>,
        proof: Option<(&dyn MembershipProver, &[B256])>,
    ) -> Result<Settlement, Error> {
        let params = self.airdrop_params()?.clone();
        self.ensure_not_paused()?;
        self.ensure_not_blacklisted(sender)?;
        self.gate.admit(now)?;

        if self.has_claimed(sender) {
            return Err(Error::AlreadyClaimed);
        }

        let fee = math::percent_of(params.main_amount, params.fee_percent)?;
        let net = params
            .main_amount
            .checked_sub(fee)
            .ok_or(Error::Overflow)?;

        let eligible_referrer = self.validate_referrer(&params.referral, sender, referrer, proof, params.merkle_root)?;
        let bonus = if eligible_referrer.is_some() {
            params.referral_bonus
        } else {
            U256::ZERO
        };

        // the balance snapshot taken here is the one the payouts below are
        // settled against
        let obligation = net
            .checked_add(bonus)
            .and_then(|v| v.checked_add(fee))
            .ok_or(Error::Overflow)?;
        if ledger.balance_of(self.config.sale_token, self.address)? < obligation {
            return Err(Error::InsufficientFunds);
        }

        let cap_delta = match params.fee_accounting {
            FeeAccounting::NetOnly => net.checked_add(bonus).ok_or(Error::Overflow)?,
            FeeAccounting::GrossInCap => net
                .checked_add(bonus)
                .and_then(|v| v.checked_add(fee))
                .ok_or(Error::Overflow)?,
        };

        // one-way latch, set before the supply check and before any
        // transfer; a supply rejection below still consumes it
        self.participants.entry(sender).or_default().claimed = true;

        let new_total = self
            .total_distributed
            .checked_add(cap_delta)
            .ok_or(Error::Overflow)?;
        if new_total > self.config.supply_cap {
            return Err(Error::SupplyExhausted);
        }

        // effects
        self.total_distributed = new_total;
        if let Some(r) = eligible_referrer {
            if matches!(params.referral, ReferralRule::SelfClaimed { .. }) {
                self.participants.entry(r).or_default().referral_count += 1;
            }
        }
        if fee > U256::ZERO {
            self.emit(Event::FeePaid {
                recipient: params.fee_recipient,
                amount: fee,
            });
        }
        if let Some(r) = eligible_referrer {
            if bonus > U256::ZERO {
                self.emit(Event::ReferralRewarded {
                    referrer: r,
                    claimant: sender,
                    bonus,
                });
            }
        }
        self.emit(Event::Claimed {
            claimant: sender,
            net,
            fee,
        });
        info!(claimant = %sender, %net, %fee, %bonus, "airdrop claimed");

        // interactions
        let token = self.config.sale_token;
        let currency = Currency::Token(token);
        let mut settlement = Settlement {
            granted: net,
            transfers: Vec::new(),
        };
        if fee > U256::ZERO {
            ledger.transfer(token, self.address, params.fee_recipient, fee)?;
            settlement.push(currency, params.fee_recipient, fee);
        }
        if let Some(r) = eligible_referrer {
            if bonus > U256::ZERO {
                ledger.transfer(token, self.address, r, bonus)?;
                settlement.push(currency, r, bonus);
            }
        }
        ledger.transfer(token, self.address, sender, net)?;
        settlement.push(currency, sender, net);
        Ok(settlement)
    }

    /// Resolve the supplied referrer against the campaign's eligibility
    /// rule. A zero referrer counts as "none supplied"; the claimant and the
    /// campaign itself are rejected outright.
    fn validate_referrer(
        &self,
        rule: &ReferralRule,
        sender: Address,
        referrer: Option<Address>,
        proof: Option<(&dyn MembershipProver, &[B256])>,
        root: Option<B256>,
    ) -> Result<Option<Address>, Error> {
        let Some(referrer) = referrer else {
            return Ok(None);
        };
        if referrer == Address::ZERO {
            return Ok(None);
        }
        if referrer == sender {
            return Err(Error::InvalidInput(
                "claimant cannot refer itself".to_string(),
            ));
        }
        if referrer == self.address {
            return Err(Error::InvalidInput(
                "campaign cannot be the referrer".to_string(),
            ));
        }
        match rule {
            ReferralRule::None => Ok(None),
            ReferralRule::SelfClaimed { max_referrals } => {
                if !self.has_claimed(referrer) {
                    return Err(Error::InvalidInput(
                        "referrer has not claimed yet".to_string(),
                    ));
                }
                if self.referral_count_of(referrer) >= *max_referrals {
                    return Err(Error::InvalidInput(
                        "referrer reached the referral limit".to_string(),
                    ));
                }
                Ok(Some(referrer))
            }
            ReferralRule::MerkleProof => {
                let (prover, proof) = proof.ok_or_else(|| {
                    Error::InvalidInput("membership proof required".to_string())
                })?;
                let root = root.ok_or_else(|| {
                    Error::InvalidInput("whitelist root not configured".to_string())
                })?;
                if !prover.verify(proof, root, leaf_for_address(referrer)) {
                    return Err(Error::InvalidInput(
                        "invalid membership proof".to_string(),
                    ));
                }
                Ok(Some(referrer))
            }
        }
    }
}
