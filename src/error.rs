//! Error types for ledger reads

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures of the read-only ledger boundary. All of them abort the run.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Network or JSON-RPC failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// A contract name is not registered in storage
    #[error("Resolution error: contract {0} is not registered")]
    Resolution(String),

    /// Malformed response payload or interface descriptor
    #[error("Decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn decode(msg: impl Into<String>) -> Self {
        LedgerError::Decode(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        LedgerError::Transport(msg.into())
    }
}

/// Invalid network or endpoint configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid network {0}")]
    UnknownNetwork(String),

    #[error("{0} hotfix not yet deployed")]
    HotfixNotDeployed(String),

    #[error("ETH_RPC endpoint is not set")]
    MissingEndpoint,
}
