/// Error taxonomy for the distribution engine
///
/// Every failure is a synchronous, all-or-nothing abort: the host transaction
/// discards any state the aborted operation touched. The one deliberate
/// exception (the claim latch surviving a supply-cap rejection) is documented
/// on [`crate::campaign::Campaign::claim`].
use crate::lifecycle::RejectReason;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller is not the campaign owner
    #[error("caller is not the campaign owner")]
    Unauthorized,

    /// Sender has been blacklisted by the owner
    #[error("sender is blacklisted")]
    Blacklisted,

    /// Operation attempted outside its valid lifecycle state
    #[error("lifecycle violation: {0}")]
    Lifecycle(RejectReason),

    /// One-shot claim replayed for the same address
    #[error("allocation already claimed")]
    AlreadyClaimed,

    /// Claim or sweep found nothing to pay out
    #[error("nothing to claim")]
    NothingToClaim,

    /// Granting the request would breach the configured supply ceiling
    #[error("supply cap exhausted")]
    SupplyExhausted,

    /// The addressed phase has no remaining capacity
    #[error("phase capacity exceeded")]
    CapacityExceeded,

    /// Computed allocation fell below the caller-specified minimum
    #[error("computed allocation below caller minimum")]
    SlippageExceeded,

    /// Malformed or inconsistent request or configuration input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Campaign balance cannot cover the computed obligation
    #[error("campaign balance cannot cover the computed obligation")]
    InsufficientFunds,

    /// The token ledger denied a transfer; propagated, never swallowed
    #[error("external transfer failed: {0}")]
    ExternalCall(String),

    /// Arithmetic would wrap; the operation aborts instead
    #[error("arithmetic overflow")]
    Overflow,

    /// A state-mutating entry point was re-entered while locked
    #[error("reentrant call")]
    Reentrancy,
}
