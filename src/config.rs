/// Campaign configuration
///
/// The deployed contract family differs along five axes; each axis is an
/// explicit configuration value here rather than a separate code path, and
/// the five presets on [`crate::campaign::Campaign`] pin the combinations
/// observed in production.
use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::lifecycle::ScheduleModel;

/// Seconds in the default post-finalization claim window.
pub const DEFAULT_CLAIM_PERIOD: u64 = 30 * 24 * 60 * 60;

/// Whether the protocol fee participates in supply-cap accounting.
///
/// The two airdrop variants genuinely diverge here: one tracks only
/// net + referral amounts against the cap while still charging the fee from
/// the gross amount, the other counts the gross. Both behaviors are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeAccounting {
    /// Only net payout + referral bonus count against the cap.
    NetOnly,
    /// Fee, net payout and referral bonus all count against the cap.
    GrossInCap,
}

/// Referrer eligibility rule for airdrop claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralRule {
    /// Referrals are not paid.
    None,
    /// The referrer must have claimed already and stays under a per-address
    /// referral count cap.
    SelfClaimed { max_referrals: u32 },
    /// The referrer must carry a valid membership proof against the current
    /// root; no self-claim prerequisite, no count cap.
    MerkleProof,
}

/// When purchased tokens actually move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementModel {
    /// Tokens transfer inside the purchase operation.
    Immediate,
    /// Purchases record entitlement; tokens move at claim after finalization.
    DeferredClaim,
}

/// Accepted payment legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCurrencies {
    NativeOnly,
    NativeAndTokens,
}

/// Flat-amount airdrop parameters (both referral variants).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropParams {
    /// Gross amount per claim; fee and net payout are carved out of this.
    pub main_amount: U256,
    /// Fee percent of the gross amount, 0..=100.
    pub fee_percent: u8,
    pub fee_recipient: Address,
    /// Bonus paid to an eligible referrer on top of the claimant's net.
    pub referral_bonus: U256,
    pub referral: ReferralRule,
    pub fee_accounting: FeeAccounting,
    /// Whitelist root; required when `referral` is `MerkleProof`.
    pub merkle_root: Option<B256>,
}

impl AirdropParams {
    pub fn validate(&self) -> Result<(), Error> {
        if self.main_amount.is_zero() {
            return Err(Error::InvalidInput(
                "main amount must be non-zero".to_string(),
            ));
        }
        if self.fee_percent > 100 {
            return Err(Error::InvalidInput(
                "fee percent must be at most 100".to_string(),
            ));
        }
        if self.fee_percent > 0 && self.fee_recipient == Address::ZERO {
            return Err(Error::InvalidInput(
                "fee recipient must be set when a fee is charged".to_string(),
            ));
        }
        if matches!(self.referral, ReferralRule::MerkleProof) && self.merkle_root.is_none() {
            return Err(Error::InvalidInput(
                "merkle referral rule requires a whitelist root".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed-price presale parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPresaleParams {
    /// Tokens per native coin, as an 18-decimal fixed-point rate:
    /// `tokens = paid * rate * 10^token_decimals / 10^18`.
    pub rate: U256,
    pub token_decimals: u8,
    /// Inclusive bounds on the tendered native value per purchase.
    pub min_buy: U256,
    pub max_buy: U256,
}

impl FixedPresaleParams {
    pub fn validate(&self) -> Result<(), Error> {
        if self.rate.is_zero() {
            return Err(Error::InvalidInput("rate must be non-zero".to_string()));
        }
        if self.max_buy < self.min_buy {
            return Err(Error::InvalidInput(
                "max buy must not undercut min buy".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tiered presale parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredPresaleParams {
    /// Whether excess native payment beyond the clamped allocation is sent
    /// back. The production tiered sale keeps the full tendered value.
    pub refund_excess: bool,
    /// Fixed delay between proposing a tier update and committing it.
    pub proposal_delay: u64,
}

/// Multi-payment phased sale parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasedSaleParams {
    /// Decimals of the token being sold; prices are per whole token scaled
    /// by `10^sale_token_decimals`.
    pub sale_token_decimals: u8,
    /// Claim window applied at finalization when the owner does not request
    /// an explicit period.
    pub default_claim_period: u64,
}

impl Default for PhasedSaleParams {
    fn default() -> Self {
        Self {
            sale_token_decimals: 18,
            default_claim_period: DEFAULT_CLAIM_PERIOD,
        }
    }
}

/// Per-model distribution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionModel {
    Airdrop(AirdropParams),
    FixedPresale(FixedPresaleParams),
    TieredPresale(TieredPresaleParams),
    PhasedSale(PhasedSaleParams),
}

/// One bounded allocation window with its own capacity and prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub capacity: U256,
    pub sold: U256,
    pub active: bool,
    /// Price per whole sale token in native coin; zero means unset.
    pub price_native: U256,
    /// Price per whole sale token in each accepted payment token.
    pub price_by_token: HashMap<Address, U256>,
}

impl Phase {
    pub fn remaining(&self) -> U256 {
        self.capacity.saturating_sub(self.sold)
    }

    pub fn is_exhausted(&self) -> bool {
        self.sold >= self.capacity
    }
}

/// Owner input for adding a phase/tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseParams {
    pub capacity: U256,
    pub price_native: U256,
    pub prices_by_token: Vec<(Address, U256)>,
}

impl PhaseParams {
    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity.is_zero() {
            return Err(Error::InvalidInput(
                "phase capacity must be non-zero".to_string(),
            ));
        }
        for (token, price) in &self.prices_by_token {
            if *token == Address::ZERO {
                return Err(Error::InvalidInput(
                    "payment token address must be non-zero".to_string(),
                ));
            }
            if price.is_zero() {
                return Err(Error::InvalidInput(
                    "payment token price must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn into_phase(self, active: bool) -> Phase {
        Phase {
            capacity: self.capacity,
            sold: U256::ZERO,
            active,
            price_native: self.price_native,
            price_by_token: self.prices_by_token.into_iter().collect(),
        }
    }
}

/// Staged tier values promoted by a committed proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUpdate {
    pub price_native: U256,
    pub capacity: U256,
}

/// Full campaign configuration: the variant axes plus model parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// The token being distributed or sold.
    pub sale_token: Address,
    /// Hard ceiling on cumulative distribution.
    pub supply_cap: U256,
    pub schedule: ScheduleModel,
    pub settlement: SettlementModel,
    pub currencies: PaymentCurrencies,
    pub model: DistributionModel,
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.sale_token == Address::ZERO {
            return Err(Error::InvalidInput(
                "sale token address must be non-zero".to_string(),
            ));
        }
        if self.supply_cap.is_zero() {
            return Err(Error::InvalidInput(
                "supply cap must be non-zero".to_string(),
            ));
        }
        match &self.model {
            DistributionModel::Airdrop(p) => p.validate()?,
            DistributionModel::FixedPresale(p) => p.validate()?,
            DistributionModel::TieredPresale(_) => {}
            DistributionModel::PhasedSale(_) => {}
        }
        let deferred = matches!(self.settlement, SettlementModel::DeferredClaim);
        let phased = matches!(self.model, DistributionModel::PhasedSale(_));
        if deferred != phased {
            return Err(Error::InvalidInput(
                "deferred claim settlement is exactly the phased sale model".to_string(),
            ));
        }
        if matches!(self.currencies, PaymentCurrencies::NativeAndTokens) && !phased {
            return Err(Error::InvalidInput(
                "token payments are only accepted by the phased sale model".to_string(),
            ));
        }
        Ok(())
    }
}
