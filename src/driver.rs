//! Audit driver: collect discrepancies, then verify the hotfix against them

use crate::collector::{collect_discrepancies, CollectorOptions, Progress};
use crate::config::AuditConfig;
use crate::cross_validate::{verify_errors, ValidationReport};
use crate::error::Result;
use crate::ledger::{HotfixContract, LedgerReader, RemediationSource, RpcLedger};
use crate::rpc_client::EthRpcClient;
use std::sync::Arc;

/// Run both phases in sequence against any reader and remediation source
pub async fn run_audit<L, R, F>(
    ledger: &L,
    remediation: &R,
    options: &CollectorOptions,
    on_progress: F,
) -> Result<ValidationReport>
where
    L: LedgerReader + ?Sized,
    R: RemediationSource + ?Sized,
    F: FnMut(Progress),
{
    let discrepancies = collect_discrepancies(ledger, options, on_progress).await?;
    tracing::info!("Found {} errors", discrepancies.len());

    tracing::info!("Verifying hotfix errors...");
    verify_errors(remediation, discrepancies).await
}

/// Connect to the configured endpoint and audit the live chain
pub async fn run(config: &AuditConfig) -> Result<ValidationReport> {
    let rpc = Arc::new(EthRpcClient::new(config.rpc.clone())?);
    let chain_id = rpc.chain_id().await?;
    let head = rpc.block_number().await?;
    tracing::info!(network = %config.deployment.network, chain_id, head, url = rpc.url(), "connected");

    let ledger = RpcLedger::connect(rpc.clone(), config.deployment.storage).await?;
    tracing::info!(storage = %ledger.storage().address(), "connected to registry");
    for contract in [ledger.node_manager(), ledger.minipool_manager()] {
        tracing::info!(contract = %contract.name, address = %contract.address, "resolved");
    }
    let hotfix = HotfixContract::new(rpc, config.deployment.hotfix)?;
    tracing::info!(address = %hotfix.address(), "using hotfix contract");

    let options = CollectorOptions {
        progress_every: config.progress_every,
        concurrency: config.concurrency,
    };

    run_audit(&ledger, &hotfix, &options, |progress| {
        if progress.checked == 0 {
            tracing::info!("Checking {} nodes, this could take a while...", progress.total);
        } else {
            tracing::info!("Checked {} of {}", progress.checked, progress.total);
        }
    })
    .await
}
