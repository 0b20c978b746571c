// staking/src/engine.rs

use crate::{
    check::Checker, context::Context, deliver::Deliverer, store::StakeStore, tx::StakeTx,
    StakingResult,
};
use chain_core::Ledger;

/// Admission check: decide whether `tx` is valid against the current
/// snapshot without mutating anything.
///
/// Invoked on mempool entry and again as the first step of delivery;
/// idempotent and deterministic for a given snapshot.
pub fn check_tx<S: StakeStore, L: Ledger>(
    store: &S,
    ledger: &L,
    ctx: &Context,
    tx: &StakeTx,
) -> StakingResult<()> {
    let sender = ctx.single_signer()?;
    let params = store.load_params();
    let checker = Checker::new(store, ledger, params, sender);

    match tx {
        StakeTx::DeclareCandidacy(inner) => checker.declare_candidacy(inner),
        StakeTx::UpdateCandidacy(inner) => checker.update_candidacy(inner),
        StakeTx::WithdrawCandidacy(inner) => checker.withdraw_candidacy(inner),
        StakeTx::VerifyCandidacy(inner) => checker.verify_candidacy(inner),
        StakeTx::Delegate(inner) => checker.delegate(inner),
        StakeTx::Withdraw(inner) => checker.withdraw(inner),
    }
}

/// Deliver `tx`: re-run admission against the current block state, then
/// apply the effects all-or-nothing.
///
/// A transaction that fails admission here leaves the snapshot untouched,
/// and a mid-sequence delivery failure rolls the stores back to the state
/// before this transaction.
pub fn deliver_tx<S: StakeStore, L: Ledger>(
    store: &mut S,
    ledger: &mut L,
    ctx: &Context,
    tx: &StakeTx,
) -> StakingResult<()> {
    // transactions may be delivered in a different order than they were
    // checked; re-validate against current block state
    check_tx(store, ledger, ctx, tx)?;

    let sender = ctx.single_signer()?;
    let params = store.load_params();

    store.checkpoint();
    ledger.checkpoint();

    let mut deliverer = Deliverer::new(store, ledger, params, sender, ctx.block_time);
    let result = match tx {
        StakeTx::DeclareCandidacy(inner) => deliverer.declare_candidacy(inner),
        StakeTx::UpdateCandidacy(inner) => deliverer.update_candidacy(inner),
        StakeTx::WithdrawCandidacy(inner) => deliverer.withdraw_candidacy(inner),
        StakeTx::VerifyCandidacy(inner) => deliverer.verify_candidacy(inner),
        StakeTx::Delegate(inner) => deliverer.delegate(inner),
        StakeTx::Withdraw(inner) => deliverer.withdraw(inner),
    };

    match result {
        Ok(()) => {
            store.commit();
            ledger.commit();
            Ok(())
        }
        Err(err) => {
            store.rollback();
            ledger.rollback();
            tracing::warn!(%err, "staking delivery failed, state rolled back");
            Err(err)
        }
    }
}
