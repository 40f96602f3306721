//! Discrepancy collection
//!
//! Walks the node registry, skips nodes whose fee distributor is not yet
//! initialised, and compares each remaining node's cached fee numerator with
//! the value recomputed from its minipools.

use crate::aggregate::calculate_correct_numerator;
use crate::error::Result;
use crate::ledger::LedgerReader;
use crate::types::{Address, Discrepancy};
use futures::stream::{self, StreamExt};
use num_bigint::BigInt;

/// Collector settings
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Report progress after this many nodes (0 disables)
    pub progress_every: u64,
    /// Nodes checked at once. Output order is registry order regardless.
    pub concurrency: usize,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            progress_every: 100,
            concurrency: 1,
        }
    }
}

/// Progress snapshot handed to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub checked: u64,
    pub total: u64,
}

/// Compare one node's cached numerator with the recomputed value
pub async fn check_node<L>(ledger: &L, node: &Address) -> Result<Option<Discrepancy>>
where
    L: LedgerReader + ?Sized,
{
    if !ledger.fee_distributor_initialised(node).await? {
        tracing::debug!(%node, "fee distributor not initialised, skipping");
        return Ok(None);
    }

    let (numerator, expected) = futures::try_join!(
        ledger.node_fee_numerator(node),
        calculate_correct_numerator(ledger, node),
    )?;

    if numerator == expected {
        return Ok(None);
    }

    let difference = BigInt::from(expected) - BigInt::from(numerator);
    tracing::debug!(%node, %difference, "fee numerator mismatch");
    Ok(Some(Discrepancy::new(*node, difference)))
}

async fn check_node_at<L>(ledger: &L, index: u64) -> Result<Option<Discrepancy>>
where
    L: LedgerReader + ?Sized,
{
    let node = ledger.node_at(index).await?;
    check_node(ledger, &node).await
}

/// Check every registered node and return the mismatches in registry order.
/// `on_progress` fires once with `checked == 0` before the walk, then every
/// `progress_every` nodes. Any read failure aborts the pass.
pub async fn collect_discrepancies<L, F>(
    ledger: &L,
    options: &CollectorOptions,
    mut on_progress: F,
) -> Result<Vec<Discrepancy>>
where
    L: LedgerReader + ?Sized,
    F: FnMut(Progress),
{
    let total = ledger.node_count().await?;
    tracing::info!(nodes = total, concurrency = options.concurrency, "collecting fee numerator errors");
    on_progress(Progress { checked: 0, total });

    let mut checks = stream::iter(0..total)
        .map(|index| check_node_at(ledger, index))
        .buffered(options.concurrency.max(1));

    let mut discrepancies = Vec::new();
    let mut checked = 0u64;

    while let Some(result) = checks.next().await {
        if let Some(discrepancy) = result? {
            discrepancies.push(discrepancy);
        }
        checked += 1;

        if options.progress_every > 0 && checked % options.progress_every == 0 {
            on_progress(Progress { checked, total });
        }
    }

    tracing::info!(errors = discrepancies.len(), "collection complete");
    Ok(discrepancies)
}
