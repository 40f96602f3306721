//! hotfix-verify - fee distributor hotfix audit
//!
//! Recomputes every node's average fee numerator from its staking minipools,
//! compares it with the value cached in storage, and checks that the
//! published hotfix lists exactly the resulting corrections.

pub mod abi;
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod cross_validate;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod report;
pub mod rpc_client;
pub mod types;

pub use collector::{collect_discrepancies, CollectorOptions, Progress};
pub use cross_validate::{verify_errors, Finding, ValidationReport};
pub use error::{ConfigError, LedgerError};
pub use ledger::{LedgerReader, RemediationSource};
pub use types::{Address, Correction, Discrepancy, MinipoolStatus};
