pub mod campaign;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod math;
pub mod merkle;

// Main aggregate exports
pub use campaign::{Campaign, Participant, Settlement, TransferInstruction};
pub use error::Error;
pub use events::Event;

// Configuration exports
pub use config::{
    AirdropParams, CampaignConfig, DistributionModel, FeeAccounting, FixedPresaleParams,
    PaymentCurrencies, Phase, PhaseParams, PhasedSaleParams, ReferralRule, SettlementModel,
    TierUpdate, TieredPresaleParams, DEFAULT_CLAIM_PERIOD,
};

// Capability exports
pub use ledger::{Currency, InMemoryLedger, Ledger};
pub use merkle::{hash_pair, leaf_for_address, root_from_hex, KeccakProver, MembershipProver};

// Lifecycle exports
pub use lifecycle::{LifecycleGate, RejectReason, ScheduleModel, TierProposal};

// Re-export the primitive types used throughout the public API
pub use alloy_primitives::{Address, B256, U256};
