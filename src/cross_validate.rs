//! Hotfix cross-validation
//!
//! Checks that the published correction list and the computed discrepancy
//! set are the same set of `(address, amount)` pairs. Corrections are matched
//! against the first discrepancy with the same address and flag it verified;
//! after every correction has been seen, discrepancies still unflagged are
//! reported missing. Findings accumulate, they never abort validation.

use crate::error::Result;
use crate::ledger::RemediationSource;
use crate::types::{serialize_decimal, Address, Correction, Discrepancy};
use num_bigint::BigInt;
use serde::Serialize;

/// A single reason the hotfix does not match the computed errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Published count differs from the number of computed discrepancies
    CountMismatch { published: u64, expected: u64 },
    /// Correction for a node with no computed discrepancy
    UnknownCorrection {
        address: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: BigInt,
    },
    /// Correction amount differs from the computed difference
    AmountMismatch {
        address: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: BigInt,
        #[serde(serialize_with = "serialize_decimal")]
        expected: BigInt,
    },
    /// Computed discrepancy with no matching correction
    MissingCorrection {
        address: Address,
        #[serde(serialize_with = "serialize_decimal")]
        difference: BigInt,
    },
}

/// Outcome of cross-validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub published_count: u64,
    /// Discrepancies with their verification flags set
    pub discrepancies: Vec<Discrepancy>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_verified(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count_matches(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|f| matches!(f, Finding::CountMismatch { .. }))
    }
}

/// Incremental matcher fed one correction at a time
#[derive(Debug)]
pub struct Reconciler {
    published_count: u64,
    discrepancies: Vec<Discrepancy>,
    findings: Vec<Finding>,
}

impl Reconciler {
    /// Starts with the count comparison
    pub fn new(discrepancies: Vec<Discrepancy>, published_count: u64) -> Self {
        let mut findings = Vec::new();
        let expected = discrepancies.len() as u64;
        if published_count != expected {
            tracing::warn!(published = published_count, expected, "incorrect number of errors");
            findings.push(Finding::CountMismatch {
                published: published_count,
                expected,
            });
        }

        Self {
            published_count,
            discrepancies,
            findings,
        }
    }

    pub fn observe(&mut self, correction: Correction) {
        let Correction { address, amount } = correction;

        match self.discrepancies.iter_mut().find(|d| d.address == address) {
            None => {
                tracing::warn!(%address, %amount, "unknown error in hotfix");
                self.findings.push(Finding::UnknownCorrection { address, amount });
            }
            Some(discrepancy) if discrepancy.difference != amount => {
                tracing::warn!(%address, %amount, expected = %discrepancy.difference, "invalid error amount");
                self.findings.push(Finding::AmountMismatch {
                    address,
                    amount,
                    expected: discrepancy.difference.clone(),
                });
            }
            Some(discrepancy) => discrepancy.verified = true,
        }
    }

    /// Report every discrepancy that no correction verified
    pub fn finish(mut self) -> ValidationReport {
        for discrepancy in self.discrepancies.iter().filter(|d| !d.verified) {
            tracing::warn!(address = %discrepancy.address, difference = %discrepancy.difference, "error not found in hotfix");
            self.findings.push(Finding::MissingCorrection {
                address: discrepancy.address,
                difference: discrepancy.difference.clone(),
            });
        }

        ValidationReport {
            published_count: self.published_count,
            discrepancies: self.discrepancies,
            findings: self.findings,
        }
    }
}

/// Read every published correction and match it against `discrepancies`.
/// A read failure aborts with no verdict.
pub async fn verify_errors<R>(source: &R, discrepancies: Vec<Discrepancy>) -> Result<ValidationReport>
where
    R: RemediationSource + ?Sized,
{
    let count = source.error_count().await?;
    tracing::info!(published = count, computed = discrepancies.len(), "verifying hotfix errors");

    let mut reconciler = Reconciler::new(discrepancies, count);
    for i in 0..count {
        let correction = source.error_at(i).await?;
        tracing::debug!(index = i, address = %correction.address, amount = %correction.amount, "hotfix entry");
        reconciler.observe(correction);
    }

    Ok(reconciler.finish())
}
