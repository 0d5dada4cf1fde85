/// Observable event stream
///
/// One variant per state transition, carrying enough fields for an external
/// consumer to reconstruct the ledger mutation (actor, amounts, phase id).
/// Events are buffered on the campaign and drained by the host after each
/// successful operation; aborted operations leave nothing behind.
use crate::ledger::Currency;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum Event {
    // ============ Distribution ============
    Claimed {
        claimant: Address,
        net: U256,
        fee: U256,
    },
    FeePaid {
        recipient: Address,
        amount: U256,
    },
    ReferralRewarded {
        referrer: Address,
        claimant: Address,
        bonus: U256,
    },
    Purchased {
        buyer: Address,
        phase: Option<u32>,
        currency: Currency,
        tendered: U256,
        cost: U256,
        tokens: U256,
        refund: U256,
    },
    TierAdvanced {
        tier: u32,
    },
    TokensClaimed {
        claimant: Address,
        amount: U256,
    },

    // ============ Lifecycle ============
    SaleStarted,
    SaleStopped,
    ScheduleUpdated {
        start: u64,
        stop: u64,
    },
    Finalized {
        total_sold: U256,
        claim_deadline: u64,
    },
    Swept {
        to: Address,
        amount: U256,
    },
    FundsWithdrawn {
        to: Address,
        currency: Currency,
        amount: U256,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },

    // ============ Configuration ============
    FeeUpdated {
        percent: u8,
        recipient: Address,
    },
    AirdropAmountUpdated {
        amount: U256,
    },
    ReferralConfigUpdated {
        bonus: U256,
        max_referrals: u32,
    },
    MerkleRootUpdated {
        root: B256,
    },
    SupplyCapUpdated {
        cap: U256,
    },
    PhaseAdded {
        phase: u32,
        capacity: U256,
        price_native: U256,
    },
    PhaseCapacityUpdated {
        phase: u32,
        capacity: U256,
    },
    PhaseActiveSet {
        phase: u32,
        active: bool,
    },
    PriceUpdated {
        phase: u32,
        currency: Currency,
        price: U256,
    },
    TiersProposed {
        tiers: u32,
        proposed_at: u64,
    },
    TiersCommitted {
        tiers: u32,
    },
    BlacklistUpdated {
        address: Address,
        blocked: bool,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}

impl Event {
    /// JSON rendering for off-chain consumers and logs.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
