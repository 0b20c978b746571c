// staking/src/store.rs

use crate::{
    candidate::Candidate,
    delegation::{DelegateHistory, Delegation},
    params::Params,
};
use chain_core::{Address, PubKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;

/// Staking state capability: candidate ledger, delegation ledger,
/// parameter store and history log.
///
/// Injected into the checker and deliverer so the host can back it with
/// its persistent KV store; tests use [`MemStakeStore`]. Reads take `&self`
/// and are side-effect-free; only the deliverer holds this mutably.
pub trait StakeStore {
    /// Look up a live candidate by its owner address
    fn candidate_by_address(&self, owner: &Address) -> Option<Candidate>;

    /// Look up a live candidate by its consensus public key
    fn candidate_by_pub_key(&self, pub_key: &PubKey) -> Option<Candidate>;

    /// Insert or replace a candidate, keyed by its owner address
    fn save_candidate(&mut self, candidate: Candidate);

    /// Remove the candidate owned by `owner`, if any
    fn remove_candidate(&mut self, owner: &Address);

    /// Look up a live delegation by its (delegator, candidate) key
    fn delegation(&self, delegator: &Address, candidate: &Address) -> Option<Delegation>;

    /// Insert or replace a delegation
    fn save_delegation(&mut self, delegation: Delegation);

    /// Remove a delegation, if any
    fn remove_delegation(&mut self, delegator: &Address, candidate: &Address);

    /// All live delegations to `candidate`, in deterministic key order
    fn delegations_by_candidate(&self, candidate: &Address) -> Vec<Delegation>;

    /// Current staking parameters (defaults before genesis initialization)
    fn load_params(&self) -> Params;

    fn save_params(&mut self, params: Params);

    /// Append to the audit history log
    fn append_history(&mut self, entry: DelegateHistory);

    fn history(&self) -> Vec<DelegateHistory>;

    /// Open a rollback point
    fn checkpoint(&mut self);

    /// Discard the most recent rollback point, keeping changes
    fn commit(&mut self);

    /// Restore state to the most recent rollback point
    fn rollback(&mut self);
}

/// In-memory staking store. BTreeMaps keep iteration order deterministic
/// across replicas, which the state digest relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemStakeStore {
    candidates: BTreeMap<Address, Candidate>,
    pub_key_index: BTreeMap<PubKey, Address>,
    delegations: BTreeMap<(Address, Address), Delegation>,
    history: Vec<DelegateHistory>,
    params: Option<Params>,
    #[serde(skip)]
    snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    candidates: BTreeMap<Address, Candidate>,
    pub_key_index: BTreeMap<PubKey, Address>,
    delegations: BTreeMap<(Address, Address), Delegation>,
    history_len: usize,
    params: Option<Params>,
}

impl MemStakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keccak-256 digest over the full staking state. Equal digests mean
    /// byte-for-byte equal state; tests use this to assert that rejected
    /// transactions change nothing.
    pub fn state_digest(&self) -> String {
        let bytes = bincode::serialize(&(
            &self.candidates,
            &self.delegations,
            &self.history,
            &self.params,
        ))
        .expect("in-memory staking state always serializes");
        hex::encode(Keccak256::digest(bytes))
    }

    /// Number of live candidates
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// All live candidates in owner-address order
    pub fn candidates(&self) -> Vec<Candidate> {
        self.candidates.values().cloned().collect()
    }
}

impl StakeStore for MemStakeStore {
    fn candidate_by_address(&self, owner: &Address) -> Option<Candidate> {
        self.candidates.get(owner).cloned()
    }

    fn candidate_by_pub_key(&self, pub_key: &PubKey) -> Option<Candidate> {
        let owner = self.pub_key_index.get(pub_key)?;
        self.candidates.get(owner).cloned()
    }

    fn save_candidate(&mut self, candidate: Candidate) {
        self.pub_key_index
            .insert(candidate.pub_key, candidate.owner_address);
        self.candidates.insert(candidate.owner_address, candidate);
    }

    fn remove_candidate(&mut self, owner: &Address) {
        if let Some(candidate) = self.candidates.remove(owner) {
            self.pub_key_index.remove(&candidate.pub_key);
        }
    }

    fn delegation(&self, delegator: &Address, candidate: &Address) -> Option<Delegation> {
        self.delegations.get(&(*delegator, *candidate)).cloned()
    }

    fn save_delegation(&mut self, delegation: Delegation) {
        let key = (delegation.delegator_address, delegation.candidate_address);
        self.delegations.insert(key, delegation);
    }

    fn remove_delegation(&mut self, delegator: &Address, candidate: &Address) {
        self.delegations.remove(&(*delegator, *candidate));
    }

    fn delegations_by_candidate(&self, candidate: &Address) -> Vec<Delegation> {
        self.delegations
            .values()
            .filter(|d| d.candidate_address == *candidate)
            .cloned()
            .collect()
    }

    fn load_params(&self) -> Params {
        self.params.clone().unwrap_or_default()
    }

    fn save_params(&mut self, params: Params) {
        self.params = Some(params);
    }

    fn append_history(&mut self, entry: DelegateHistory) {
        self.history.push(entry);
    }

    fn history(&self) -> Vec<DelegateHistory> {
        self.history.clone()
    }

    fn checkpoint(&mut self) {
        self.snapshots.push(Snapshot {
            candidates: self.candidates.clone(),
            pub_key_index: self.pub_key_index.clone(),
            delegations: self.delegations.clone(),
            history_len: self.history.len(),
            params: self.params.clone(),
        });
    }

    fn commit(&mut self) {
        self.snapshots.pop();
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshots.pop() {
            self.candidates = snapshot.candidates;
            self.pub_key_index = snapshot.pub_key_index;
            self.delegations = snapshot.delegations;
            self.history.truncate(snapshot.history_len);
            self.params = snapshot.params;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Description;
    use chain_core::Amount;

    fn addr(tag: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = tag;
        Address::new(bytes)
    }

    fn candidate(owner: Address) -> Candidate {
        Candidate::new(
            PubKey::generate(),
            owner,
            Amount::zero(),
            0,
            Amount::from_tokens(1000),
            "0.1".into(),
            Description::default(),
            1,
        )
    }

    #[test]
    fn test_candidate_lookup_by_both_keys() {
        let mut store = MemStakeStore::new();
        let c = candidate(addr(1));
        let key = c.pub_key;
        store.save_candidate(c);

        assert!(store.candidate_by_address(&addr(1)).is_some());
        assert!(store.candidate_by_pub_key(&key).is_some());
        assert!(store.candidate_by_address(&addr(2)).is_none());
    }

    #[test]
    fn test_remove_candidate_clears_pub_key_index() {
        let mut store = MemStakeStore::new();
        let c = candidate(addr(1));
        let key = c.pub_key;
        store.save_candidate(c);
        store.remove_candidate(&addr(1));

        assert!(store.candidate_by_pub_key(&key).is_none());
        assert_eq!(store.candidate_count(), 0);
    }

    #[test]
    fn test_delegations_by_candidate_filters() {
        let mut store = MemStakeStore::new();
        store.save_delegation(Delegation::new(addr(1), addr(9), Amount::from_u64(10), 1));
        store.save_delegation(Delegation::new(addr(2), addr(9), Amount::from_u64(20), 1));
        store.save_delegation(Delegation::new(addr(1), addr(8), Amount::from_u64(30), 1));

        let found = store.delegations_by_candidate(&addr(9));
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| d.candidate_address == addr(9)));
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut store = MemStakeStore::new();
        store.save_candidate(candidate(addr(1)));
        let before = store.state_digest();

        store.checkpoint();
        store.save_candidate(candidate(addr(2)));
        store.save_delegation(Delegation::new(addr(3), addr(2), Amount::from_u64(5), 1));
        store.append_history(DelegateHistory {
            delegator_address: addr(3),
            candidate_address: addr(2),
            amount: Amount::from_u64(5),
            kind: crate::delegation::HistoryKind::Delegate,
            timestamp: 1,
        });
        store.rollback();

        assert_eq!(store.state_digest(), before);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut store = MemStakeStore::new();
        store.checkpoint();
        store.save_candidate(candidate(addr(1)));
        store.commit();

        assert_eq!(store.candidate_count(), 1);
    }

    #[test]
    fn test_digest_changes_with_state() {
        let mut store = MemStakeStore::new();
        let empty = store.state_digest();
        store.save_candidate(candidate(addr(1)));
        assert_ne!(store.state_digest(), empty);
    }
}
