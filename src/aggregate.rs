//! Fee numerator recomputation
//!
//! A node's average fee numerator is the sum of `getNodeFee()` over its
//! minipools that are currently staking. Minipools are walked in index order
//! so the same chain state always produces the same sequence of reads.

use crate::error::Result;
use crate::ledger::LedgerReader;
use crate::types::Address;
use num_bigint::BigUint;

/// Recompute the expected fee numerator for `node`
pub async fn calculate_correct_numerator<L>(ledger: &L, node: &Address) -> Result<BigUint>
where
    L: LedgerReader + ?Sized,
{
    let count = ledger.node_minipool_count(node).await?;
    let mut numerator = BigUint::default();

    for i in 0..count {
        let minipool = ledger.node_minipool_at(node, i).await?;
        let status = ledger.minipool_status(&minipool).await?;
        tracing::trace!(%node, %minipool, status = status.tag(), "minipool status");

        if status.is_staking() {
            numerator += ledger.minipool_node_fee(&minipool).await?;
        }
    }

    Ok(numerator)
}
