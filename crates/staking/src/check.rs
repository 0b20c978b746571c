// staking/src/check.rs

use crate::{
    candidate::Candidate,
    params::{scale_by_ratio, Params},
    store::StakeStore,
    tx::{
        parse_amount, DeclareCandidacy, Delegate, UpdateCandidacy, VerifyCandidacy, Withdraw,
        WithdrawCandidacy,
    },
    StakingError, StakingResult,
};
use chain_core::{Address, Amount, Ledger};

/// Read-only admission validation of staking transactions.
///
/// Runs on mempool entry and again as the first step of delivery. Every
/// method is a pure read over the injected store and ledger: safe to
/// re-run any number of times, deterministic over a given snapshot.
pub struct Checker<'a, S: StakeStore, L: Ledger> {
    store: &'a S,
    ledger: &'a L,
    params: Params,
    sender: Address,
}

impl<'a, S: StakeStore, L: Ledger> Checker<'a, S, L> {
    pub fn new(store: &'a S, ledger: &'a L, params: Params, sender: Address) -> Self {
        Self {
            store,
            ledger,
            params,
            sender,
        }
    }

    pub fn declare_candidacy(&self, tx: &DeclareCandidacy) -> StakingResult<()> {
        if self.store.candidate_by_address(&self.sender).is_some() {
            return Err(StakingError::AlreadyDeclared);
        }
        if self.store.candidate_by_pub_key(&tx.pub_key).is_some() {
            return Err(StakingError::AlreadyDeclared);
        }

        // Declaring implicitly self-delegates max_amount x RRR, so the
        // same rules as a delegate must hold against the prospective
        // candidate: the stake parses, the sender can fund it, and it
        // fits under the declared ceiling.
        let max_amount = parse_amount(&tx.max_amount)?;
        let self_stake = self.params.self_stake_for(&max_amount);
        if self_stake.is_zero() {
            return Err(StakingError::BadAmount(tx.max_amount.clone()));
        }
        if self.ledger.balance(&self.sender) < self_stake {
            return Err(StakingError::InsufficientFunds);
        }
        if self_stake > max_amount {
            return Err(StakingError::MaxStakeExceeded);
        }
        Ok(())
    }

    pub fn update_candidacy(&self, tx: &UpdateCandidacy) -> StakingResult<()> {
        let candidate = self
            .store
            .candidate_by_address(&self.sender)
            .ok_or(StakingError::NoCandidateForSender)?;

        if let Some(new_owner) = tx.new_address {
            if new_owner != self.sender {
                if new_owner.is_zero() {
                    return Err(StakingError::BadValidatorAddress);
                }
                if self.store.candidate_by_address(&new_owner).is_some() {
                    return Err(StakingError::AlreadyDeclared);
                }
            }
        }

        if let Some(raw) = &tx.max_amount {
            let new_max = parse_amount(raw)?;
            match plan_ceiling_change(&self.params, &candidate, &new_max)? {
                CeilingAdjustment::Unchanged => {}
                CeilingAdjustment::Charge { amount, .. } => {
                    if self.ledger.balance(&self.sender) < amount {
                        return Err(StakingError::InsufficientFunds);
                    }
                }
                CeilingAdjustment::Refund { amount, .. } => {
                    // the refund comes out of the owner's self-stake
                    let self_delegation = self
                        .store
                        .delegation(&self.sender, &self.sender)
                        .ok_or(StakingError::InsufficientFunds)?;
                    if self_delegation.shares < amount {
                        return Err(StakingError::InsufficientFunds);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn withdraw_candidacy(&self, _tx: &WithdrawCandidacy) -> StakingResult<()> {
        self.store
            .candidate_by_address(&self.sender)
            .map(|_| ())
            .ok_or(StakingError::NoCandidateForSender)
    }

    pub fn verify_candidacy(&self, tx: &VerifyCandidacy) -> StakingResult<()> {
        let candidate = self
            .store
            .candidate_by_address(&tx.candidate_address)
            .ok_or(StakingError::NoSuchCandidate(tx.candidate_address))?;

        if self.sender != self.params.foundation_account {
            return Err(StakingError::VerificationDisallowed);
        }
        if tx.verified && candidate.is_verified() {
            return Err(StakingError::AlreadyVerified);
        }
        Ok(())
    }

    pub fn delegate(&self, tx: &Delegate) -> StakingResult<()> {
        let candidate = self
            .store
            .candidate_by_address(&tx.validator_address)
            .ok_or(StakingError::NoSuchCandidate(tx.validator_address))?;

        let amount = parse_amount(&tx.amount)?;
        if self.ledger.balance(&self.sender) < amount {
            return Err(StakingError::InsufficientFunds);
        }
        if !candidate.accepts(&amount) {
            return Err(StakingError::MaxStakeExceeded);
        }
        Ok(())
    }

    pub fn withdraw(&self, tx: &Withdraw) -> StakingResult<()> {
        self.store
            .candidate_by_address(&tx.validator_address)
            .ok_or(StakingError::NoSuchCandidate(tx.validator_address))?;

        self.store
            .delegation(&self.sender, &tx.validator_address)
            .map(|_| ())
            .ok_or(StakingError::NoSuchDelegation {
                delegator: self.sender,
                candidate: tx.validator_address,
            })
    }
}

/// The stake movement a max-shares change implies.
///
/// Shared by the checker and the deliverer so admission and delivery can
/// never disagree on the arithmetic: lowering the ceiling by delta
/// charges `delta x RRR` into escrow, raising it refunds the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CeilingAdjustment {
    Unchanged,
    Charge { amount: Amount, new_shares: Amount },
    Refund { amount: Amount, new_shares: Amount },
}

pub(crate) fn plan_ceiling_change(
    params: &Params,
    candidate: &Candidate,
    new_max: &Amount,
) -> StakingResult<CeilingAdjustment> {
    if *new_max == candidate.max_shares {
        return Ok(CeilingAdjustment::Unchanged);
    }

    if *new_max < candidate.max_shares {
        let delta = Amount::new(candidate.max_shares.inner() - new_max.inner());
        let amount = scale_by_ratio(&delta, params.reserve_requirement_ratio);
        let new_shares = Amount::new(candidate.shares.inner() + amount.inner());
        if new_shares > *new_max {
            return Err(StakingError::MaxStakeExceeded);
        }
        Ok(CeilingAdjustment::Charge { amount, new_shares })
    } else {
        let delta = Amount::new(new_max.inner() - candidate.max_shares.inner());
        let amount = scale_by_ratio(&delta, params.reserve_requirement_ratio);
        let new_shares = candidate
            .shares
            .checked_sub(&amount)
            .ok_or(StakingError::InsufficientFunds)?;
        Ok(CeilingAdjustment::Refund { amount, new_shares })
    }
}
