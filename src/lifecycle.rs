/// Lifecycle gate
///
/// Admits or rejects a request based on schedule and finalization status
/// before the distribution ledger is allowed to mutate anything. Two
/// scheduling models exist across the campaign family:
///
/// - `TimeWindow`: admission is computed as `now ∈ [start, stop)` on every
///   request; there is no stored active flag to flip.
/// - `ExplicitFlag`: the owner drives `start`/`stop` transitions explicitly,
///   and admission additionally gates on the finalization latch.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TierUpdate;
use crate::error::Error;

/// Reason a request (or an owner transition) was rejected by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotStarted,
    Ended,
    Inactive,
    Finalized,
    AlreadyActive,
    NotFinalized,
    ClaimWindowClosed,
    ClaimWindowOpen,
    DelayNotElapsed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::NotStarted => "not started",
            RejectReason::Ended => "already ended",
            RejectReason::Inactive => "sale inactive",
            RejectReason::Finalized => "already finalized",
            RejectReason::AlreadyActive => "already active",
            RejectReason::NotFinalized => "not finalized",
            RejectReason::ClaimWindowClosed => "claim window closed",
            RejectReason::ClaimWindowOpen => "claim window still open",
            RejectReason::DelayNotElapsed => "proposal delay not elapsed",
        };
        f.write_str(s)
    }
}

/// How admission is decided for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleModel {
    /// Owner flips the active flag explicitly.
    ExplicitFlag,
    /// Admission is `now ∈ [start, stop)`, recomputed per request.
    TimeWindow { start: u64, stop: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleGate {
    schedule: ScheduleModel,
    active: bool,
    finalized: bool,
}

impl LifecycleGate {
    /// Gate for the explicit-flag variants; starts inactive.
    pub fn flag() -> Self {
        Self {
            schedule: ScheduleModel::ExplicitFlag,
            active: false,
            finalized: false,
        }
    }

    /// Gate for the timestamp-window variant.
    pub fn window(start: u64, stop: u64) -> Result<Self, Error> {
        validate_window(start, stop)?;
        Ok(Self {
            schedule: ScheduleModel::TimeWindow { start, stop },
            active: false,
            finalized: false,
        })
    }

    pub fn schedule(&self) -> ScheduleModel {
        self.schedule
    }

    /// Admit or reject a request. Must run before any ledger mutation;
    /// a rejection leaves the whole operation without observable effect.
    pub fn admit(&self, now: u64) -> Result<(), Error> {
        if self.finalized {
            return Err(Error::Lifecycle(RejectReason::Finalized));
        }
        match self.schedule {
            ScheduleModel::TimeWindow { start, stop } => {
                if now < start {
                    return Err(Error::Lifecycle(RejectReason::NotStarted));
                }
                if now >= stop {
                    return Err(Error::Lifecycle(RejectReason::Ended));
                }
                Ok(())
            }
            ScheduleModel::ExplicitFlag => {
                if !self.active {
                    return Err(Error::Lifecycle(RejectReason::Inactive));
                }
                Ok(())
            }
        }
    }

    /// Explicit owner start (flag model only).
    pub fn start(&mut self) -> Result<(), Error> {
        self.require_flag_model()?;
        if self.finalized {
            return Err(Error::Lifecycle(RejectReason::Finalized));
        }
        if self.active {
            return Err(Error::Lifecycle(RejectReason::AlreadyActive));
        }
        self.active = true;
        debug!("lifecycle gate opened");
        Ok(())
    }

    /// Explicit owner stop (flag model only).
    pub fn stop(&mut self) -> Result<(), Error> {
        self.require_flag_model()?;
        if !self.active {
            return Err(Error::Lifecycle(RejectReason::Inactive));
        }
        self.active = false;
        debug!("lifecycle gate closed");
        Ok(())
    }

    /// Reschedule the admission window (window model only).
    pub fn set_window(&mut self, start: u64, stop: u64) -> Result<(), Error> {
        match self.schedule {
            ScheduleModel::TimeWindow { .. } => {
                validate_window(start, stop)?;
                self.schedule = ScheduleModel::TimeWindow { start, stop };
                Ok(())
            }
            ScheduleModel::ExplicitFlag => Err(Error::InvalidInput(
                "campaign is not window-scheduled".to_string(),
            )),
        }
    }

    /// One-way finalization latch; also deactivates the flag.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if self.finalized {
            return Err(Error::Lifecycle(RejectReason::Finalized));
        }
        self.finalized = true;
        self.active = false;
        debug!("lifecycle gate finalized");
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn is_open(&self, now: u64) -> bool {
        self.admit(now).is_ok()
    }

    fn require_flag_model(&self) -> Result<(), Error> {
        match self.schedule {
            ScheduleModel::ExplicitFlag => Ok(()),
            ScheduleModel::TimeWindow { .. } => Err(Error::InvalidInput(
                "campaign is window-scheduled; start/stop are implicit".to_string(),
            )),
        }
    }
}

fn validate_window(start: u64, stop: u64) -> Result<(), Error> {
    if stop <= start {
        return Err(Error::InvalidInput(
            "schedule window must stop after it starts".to_string(),
        ));
    }
    Ok(())
}

/// Two-step tier update staging
///
/// `propose` stores the staged tiers and the proposal timestamp
/// unconditionally, overwriting any prior unapplied proposal. `commit`
/// succeeds only once the fixed delay has elapsed, hands back every staged
/// tier for atomic promotion, and clears the staging area. Committing with
/// nothing staged is a no-op success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProposal {
    delay: u64,
    staged: Vec<TierUpdate>,
    proposed_at: u64,
    pending: bool,
}

impl TierProposal {
    pub fn new(delay: u64) -> Self {
        Self {
            delay,
            staged: Vec::new(),
            proposed_at: 0,
            pending: false,
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn proposed_at(&self) -> Option<u64> {
        self.pending.then_some(self.proposed_at)
    }

    /// Whether a pending proposal has outlived its commit delay.
    pub fn is_ready(&self, now: u64) -> bool {
        self.pending && now >= self.proposed_at.saturating_add(self.delay)
    }

    /// Staged entries awaiting promotion; empty when nothing is pending.
    pub fn staged(&self) -> &[TierUpdate] {
        if self.pending {
            &self.staged
        } else {
            &[]
        }
    }

    pub fn propose(&mut self, tiers: Vec<TierUpdate>, now: u64) {
        debug!(tiers = tiers.len(), now, "tier update proposed");
        self.staged = tiers;
        self.proposed_at = now;
        self.pending = true;
    }

    /// Take the staged tiers if the delay has elapsed. Empty staging area
    /// yields an empty list (iterating zero entries).
    pub fn commit(&mut self, now: u64) -> Result<Vec<TierUpdate>, Error> {
        if !self.pending {
            return Ok(Vec::new());
        }
        if now < self.proposed_at.saturating_add(self.delay) {
            return Err(Error::Lifecycle(RejectReason::DelayNotElapsed));
        }
        self.pending = false;
        self.proposed_at = 0;
        Ok(std::mem::take(&mut self.staged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn window_admission_is_half_open() {
        let gate = LifecycleGate::window(100, 200).unwrap();
        assert_eq!(
            gate.admit(99),
            Err(Error::Lifecycle(RejectReason::NotStarted))
        );
        assert_eq!(gate.admit(100), Ok(()));
        assert_eq!(gate.admit(199), Ok(()));
        assert_eq!(gate.admit(200), Err(Error::Lifecycle(RejectReason::Ended)));
    }

    #[test]
    fn empty_window_rejects_everything() {
        let err = LifecycleGate::window(100, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn flag_model_requires_explicit_start() {
        let mut gate = LifecycleGate::flag();
        assert_eq!(gate.admit(0), Err(Error::Lifecycle(RejectReason::Inactive)));
        gate.start().unwrap();
        assert_eq!(gate.admit(0), Ok(()));
        assert_eq!(
            gate.start(),
            Err(Error::Lifecycle(RejectReason::AlreadyActive))
        );
        gate.stop().unwrap();
        assert_eq!(gate.admit(0), Err(Error::Lifecycle(RejectReason::Inactive)));
    }

    #[test]
    fn finalization_is_one_way_and_gates_admission() {
        let mut gate = LifecycleGate::flag();
        gate.start().unwrap();
        gate.finalize().unwrap();
        assert_eq!(
            gate.admit(0),
            Err(Error::Lifecycle(RejectReason::Finalized))
        );
        assert_eq!(
            gate.finalize(),
            Err(Error::Lifecycle(RejectReason::Finalized))
        );
        assert_eq!(gate.start(), Err(Error::Lifecycle(RejectReason::Finalized)));
    }

    #[test]
    fn proposal_commit_respects_the_delay() {
        let mut prop = TierProposal::new(3600);
        let update = vec![TierUpdate {
            price_native: U256::from(10u8),
            capacity: U256::from(1000u16),
        }];
        prop.propose(update.clone(), 1_000);
        assert_eq!(
            prop.commit(1_000 + 3599),
            Err(Error::Lifecycle(RejectReason::DelayNotElapsed))
        );
        let applied = prop.commit(1_000 + 3600).unwrap();
        assert_eq!(applied, update);
        assert!(!prop.is_pending());
        // staging area cleared: the next commit is a no-op success
        assert_eq!(prop.commit(10_000).unwrap(), Vec::new());
    }

    #[test]
    fn repropose_overwrites_prior_staging() {
        let mut prop = TierProposal::new(100);
        prop.propose(
            vec![TierUpdate {
                price_native: U256::from(1u8),
                capacity: U256::from(1u8),
            }],
            0,
        );
        prop.propose(
            vec![TierUpdate {
                price_native: U256::from(2u8),
                capacity: U256::from(2u8),
            }],
            50,
        );
        // the clock restarts with the new proposal
        assert_eq!(
            prop.commit(120),
            Err(Error::Lifecycle(RejectReason::DelayNotElapsed))
        );
        let applied = prop.commit(150).unwrap();
        assert_eq!(applied[0].price_native, U256::from(2u8));
    }
}
