// staking/src/deliver.rs

use crate::{
    candidate::{Candidate, Verified},
    check::{plan_ceiling_change, CeilingAdjustment},
    delegation::{DelegateHistory, Delegation, HistoryKind},
    params::Params,
    store::StakeStore,
    tx::{
        parse_amount, DeclareCandidacy, Delegate, UpdateCandidacy, VerifyCandidacy, Withdraw,
        WithdrawCandidacy,
    },
    StakingError, StakingResult,
};
use chain_core::{Address, Amount, Ledger, Timestamp};

/// Applies the effects of an already-admitted staking transaction.
///
/// The only component that mutates the stake store or moves ledger
/// balances. The engine re-runs admission before constructing this and
/// brackets each call in a checkpoint, so a mid-sequence failure here is
/// rolled back rather than left half-applied.
pub struct Deliverer<'a, S: StakeStore, L: Ledger> {
    store: &'a mut S,
    ledger: &'a mut L,
    params: Params,
    sender: Address,
    now: Timestamp,
}

impl<'a, S: StakeStore, L: Ledger> Deliverer<'a, S, L> {
    pub fn new(
        store: &'a mut S,
        ledger: &'a mut L,
        params: Params,
        sender: Address,
        now: Timestamp,
    ) -> Self {
        Self {
            store,
            ledger,
            params,
            sender,
            now,
        }
    }

    pub fn declare_candidacy(&mut self, tx: &DeclareCandidacy) -> StakingResult<()> {
        let max_amount = parse_amount(&tx.max_amount)?;
        let candidate = Candidate::new(
            tx.pub_key,
            self.sender,
            Amount::zero(),
            0,
            max_amount.clone(),
            tx.cut.clone(),
            tx.description.clone(),
            self.now,
        );
        self.store.save_candidate(candidate);

        // bond the reserve requirement against the fresh candidacy
        let self_stake = self.params.self_stake_for(&max_amount);
        let owner = self.sender;
        self.bond(&owner, &self_stake)?;

        tracing::info!(owner = %owner, max_amount = %max_amount, self_stake = %self_stake,
            "candidacy declared");
        Ok(())
    }

    pub fn update_candidacy(&mut self, tx: &UpdateCandidacy) -> StakingResult<()> {
        let mut candidate = self
            .store
            .candidate_by_address(&self.sender)
            .ok_or(StakingError::NoCandidateForSender)?;

        if let Some(raw) = &tx.max_amount {
            let new_max = parse_amount(raw)?;
            match plan_ceiling_change(&self.params, &candidate, &new_max)? {
                CeilingAdjustment::Unchanged => {}
                CeilingAdjustment::Charge { amount, new_shares } => {
                    if !amount.is_zero() {
                        self.ledger
                            .transfer(&self.sender, &self.params.hold_account, &amount)?;
                        self.raise_self_delegation(&amount);
                    }
                    candidate.shares = new_shares;
                }
                CeilingAdjustment::Refund { amount, new_shares } => {
                    if !amount.is_zero() {
                        self.ledger
                            .transfer(&self.params.hold_account, &self.sender, &amount)?;
                        self.drain_self_delegation(&amount)?;
                    }
                    candidate.shares = new_shares;
                }
            }
            candidate.max_shares = new_max;
        }

        if let Some(cut) = &tx.cut {
            candidate.cut = cut.clone();
        }
        if let Some(description) = &tx.description {
            candidate.description = description.clone();
        }

        // any edit invalidates prior foundation verification
        candidate.verified = Verified::Unverified;
        candidate.updated_at = self.now;

        match tx.new_address.filter(|a| *a != self.sender) {
            Some(new_owner) => {
                let old_owner = self.sender;
                self.store.remove_candidate(&old_owner);
                candidate.owner_address = new_owner;
                self.store.save_candidate(candidate);
                self.rekey_delegations(&old_owner, &new_owner);
                tracing::info!(%old_owner, %new_owner, "candidacy reassigned");
            }
            None => self.store.save_candidate(candidate),
        }
        Ok(())
    }

    pub fn withdraw_candidacy(&mut self, _tx: &WithdrawCandidacy) -> StakingResult<()> {
        let candidate = self
            .store
            .candidate_by_address(&self.sender)
            .ok_or(StakingError::NoCandidateForSender)?;

        // hand every delegator their escrowed stake back, then drop the record
        for delegation in self.store.delegations_by_candidate(&self.sender) {
            self.ledger.transfer(
                &self.params.hold_account,
                &delegation.delegator_address,
                &delegation.shares,
            )?;
            self.store
                .remove_delegation(&delegation.delegator_address, &self.sender);
        }
        self.store.remove_candidate(&self.sender);

        tracing::info!(owner = %self.sender, pub_key = %candidate.pub_key,
            "candidacy withdrawn, all delegations refunded");
        Ok(())
    }

    pub fn verify_candidacy(&mut self, tx: &VerifyCandidacy) -> StakingResult<()> {
        let mut candidate = self
            .store
            .candidate_by_address(&tx.candidate_address)
            .ok_or(StakingError::NoSuchCandidate(tx.candidate_address))?;

        candidate.verified = if tx.verified {
            Verified::Verified
        } else {
            Verified::Unverified
        };
        candidate.updated_at = self.now;
        self.store.save_candidate(candidate);

        tracing::debug!(candidate = %tx.candidate_address, verified = tx.verified,
            "candidacy verification updated");
        Ok(())
    }

    pub fn delegate(&mut self, tx: &Delegate) -> StakingResult<()> {
        let amount = parse_amount(&tx.amount)?;
        self.bond(&tx.validator_address, &amount)
    }

    pub fn withdraw(&mut self, tx: &Withdraw) -> StakingResult<()> {
        // admission just saw these records; their absence now means the
        // serialized execution model was broken somewhere
        let delegation = self
            .store
            .delegation(&self.sender, &tx.validator_address)
            .ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "delegation {} -> {} vanished between check and deliver",
                    self.sender, tx.validator_address
                ))
            })?;
        let mut candidate = self
            .store
            .candidate_by_address(&tx.validator_address)
            .ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "candidate {} vanished between check and deliver",
                    tx.validator_address
                ))
            })?;

        self.store
            .remove_delegation(&self.sender, &tx.validator_address);

        candidate.shares = candidate
            .shares
            .checked_sub(&delegation.shares)
            .ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "candidate {} holds fewer shares than its delegations",
                    tx.validator_address
                ))
            })?;

        if candidate.shares.is_zero() {
            // zero stake means full exit, the record does not linger
            self.store.remove_candidate(&tx.validator_address);
        } else {
            candidate.updated_at = self.now;
            self.store.save_candidate(candidate);
        }

        self.store.append_history(DelegateHistory {
            delegator_address: self.sender,
            candidate_address: tx.validator_address,
            amount: delegation.shares.clone(),
            kind: HistoryKind::Withdraw,
            timestamp: self.now,
        });

        self.ledger.transfer(
            &self.params.hold_account,
            &self.sender,
            &delegation.shares,
        )?;

        tracing::debug!(delegator = %self.sender, candidate = %tx.validator_address,
            amount = %delegation.shares, "delegation withdrawn");
        Ok(())
    }

    /// Shared delegate effect: move the stake into escrow, upsert the
    /// delegation, grow the candidate's share total and record history.
    /// Used by both Delegate and the implicit self-delegation of
    /// DeclareCandidacy.
    fn bond(&mut self, validator: &Address, amount: &Amount) -> StakingResult<()> {
        self.ledger
            .transfer(&self.sender, &self.params.hold_account, amount)?;

        match self.store.delegation(&self.sender, validator) {
            Some(mut delegation) => {
                delegation.shares = Amount::new(delegation.shares.inner() + amount.inner());
                delegation.updated_at = self.now;
                self.store.save_delegation(delegation);
            }
            None => {
                self.store.save_delegation(Delegation::new(
                    self.sender,
                    *validator,
                    amount.clone(),
                    self.now,
                ));
            }
        }

        let mut candidate = self
            .store
            .candidate_by_address(validator)
            .ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "candidate {validator} vanished between check and deliver"
                ))
            })?;
        candidate.shares = Amount::new(candidate.shares.inner() + amount.inner());
        candidate.updated_at = self.now;
        self.store.save_candidate(candidate);

        self.store.append_history(DelegateHistory {
            delegator_address: self.sender,
            candidate_address: *validator,
            amount: amount.clone(),
            kind: HistoryKind::Delegate,
            timestamp: self.now,
        });

        tracing::debug!(delegator = %self.sender, candidate = %validator, %amount,
            "stake delegated");
        Ok(())
    }

    /// Grow the owner's self-delegation by `amount`, creating it if absent
    fn raise_self_delegation(&mut self, amount: &Amount) {
        match self.store.delegation(&self.sender, &self.sender) {
            Some(mut delegation) => {
                delegation.shares = Amount::new(delegation.shares.inner() + amount.inner());
                delegation.updated_at = self.now;
                self.store.save_delegation(delegation);
            }
            None => {
                self.store.save_delegation(Delegation::new(
                    self.sender,
                    self.sender,
                    amount.clone(),
                    self.now,
                ));
            }
        }
    }

    /// Shrink the owner's self-delegation by `amount`, removing it at zero
    fn drain_self_delegation(&mut self, amount: &Amount) -> StakingResult<()> {
        let mut delegation = self
            .store
            .delegation(&self.sender, &self.sender)
            .ok_or_else(|| {
                StakingError::InvariantViolation(format!(
                    "self-delegation of {} vanished between check and deliver",
                    self.sender
                ))
            })?;
        delegation.shares = delegation.shares.checked_sub(amount).ok_or_else(|| {
            StakingError::InvariantViolation(format!(
                "self-delegation of {} smaller than admitted refund",
                self.sender
            ))
        })?;

        if delegation.shares.is_zero() {
            self.store.remove_delegation(&self.sender, &self.sender);
        } else {
            delegation.updated_at = self.now;
            self.store.save_delegation(delegation);
        }
        Ok(())
    }

    /// Point every delegation at the candidate's new owner address
    fn rekey_delegations(&mut self, old_owner: &Address, new_owner: &Address) {
        for mut delegation in self.store.delegations_by_candidate(old_owner) {
            self.store
                .remove_delegation(&delegation.delegator_address, old_owner);
            delegation.candidate_address = *new_owner;
            delegation.updated_at = self.now;
            self.store.save_delegation(delegation);
        }
    }
}
