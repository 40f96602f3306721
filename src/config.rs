//! Network selection and endpoint configuration

use crate::error::ConfigError;
use crate::rpc_client::RpcConfig;
use crate::types::Address;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// 0xd8Cd47263414aFEca62d6e2a3917d6600abDceB3
const GOERLI_STORAGE: Address = Address([
    0xd8, 0xcd, 0x47, 0x26, 0x34, 0x14, 0xaf, 0xec, 0xa6, 0x2d, 0x6e, 0x2a, 0x39, 0x17, 0xd6, 0x60, 0x0a, 0xbd, 0xce, 0xb3,
]);
/// 0x52480c793374c6d8065824f174d8b4856bfb5106
const GOERLI_HOTFIX: Address = Address([
    0x52, 0x48, 0x0c, 0x79, 0x33, 0x74, 0xc6, 0xd8, 0x06, 0x58, 0x24, 0xf1, 0x74, 0xd8, 0xb4, 0x85, 0x6b, 0xfb, 0x51, 0x06,
]);
/// 0x1d8f8f00cfa6758d7bE78336684788Fb0ee0Fa46
const MAINNET_STORAGE: Address = Address([
    0x1d, 0x8f, 0x8f, 0x00, 0xcf, 0xa6, 0x75, 0x8d, 0x7b, 0xe7, 0x83, 0x36, 0x68, 0x47, 0x88, 0xfb, 0x0e, 0xe0, 0xfa, 0x46,
]);

/// Log level used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Goerli,
    Mainnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "goerli" => Ok(Network::Goerli),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Goerli => f.write_str("goerli"),
            Network::Mainnet => f.write_str("mainnet"),
        }
    }
}

/// Contract addresses for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub network: Network,
    pub storage: Address,
    pub hotfix: Address,
}

impl Deployment {
    /// Built-in addresses, with an optional hotfix override.
    /// Mainnet has no deployed hotfix, so it needs the override.
    pub fn for_network(network: Network, hotfix_override: Option<Address>) -> Result<Self, ConfigError> {
        let (storage, default_hotfix) = match network {
            Network::Goerli => (GOERLI_STORAGE, Some(GOERLI_HOTFIX)),
            Network::Mainnet => (MAINNET_STORAGE, None),
        };

        let hotfix = match (hotfix_override, default_hotfix) {
            (Some(addr), _) => addr,
            (None, Some(builtin)) => builtin,
            (None, None) => return Err(ConfigError::HotfixNotDeployed(network.to_string())),
        };

        Ok(Self {
            network,
            storage,
            hotfix,
        })
    }
}

/// Filter from `RUST_LOG`-style directives, `info` when absent or unparsable
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// `log_filter` applied to the `RUST_LOG` environment variable
pub fn env_log_filter() -> EnvFilter {
    log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

/// Load a `.env` file from the working directory or its parents.
/// A missing file is fine; a malformed one is an error.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    ignore_missing(dotenvy::dotenv())
}

/// Load a specific env file with the same missing-file rule as `load_dotenv`
pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    ignore_missing(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn ignore_missing(result: Result<PathBuf, dotenvy::Error>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Everything needed to run an audit
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub deployment: Deployment,
    pub rpc: RpcConfig,
    pub progress_every: u64,
    pub concurrency: usize,
}

impl AuditConfig {
    pub fn new(deployment: Deployment, rpc_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        if rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        Ok(Self {
            deployment,
            rpc: RpcConfig {
                url: rpc_url.to_string(),
                timeout,
            },
            progress_every: 100,
            concurrency: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse() {
        assert_eq!("goerli".parse::<Network>().unwrap(), Network::Goerli);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(
            "ropsten".parse::<Network>(),
            Err(ConfigError::UnknownNetwork("ropsten".to_string()))
        );
    }

    #[test]
    fn test_builtin_addresses() {
        let goerli = Deployment::for_network(Network::Goerli, None).unwrap();
        assert_eq!(goerli.storage.to_checksum(), "0xd8Cd47263414aFEca62d6e2a3917d6600abDceB3");
        assert_eq!(
            goerli.hotfix,
            "0x52480c793374c6d8065824f174d8b4856bfb5106".parse::<Address>().unwrap()
        );
        assert!(!goerli.hotfix.is_zero());
        assert!(!goerli.storage.is_zero());
    }

    #[test]
    fn test_mainnet_requires_hotfix() {
        assert_eq!(
            Deployment::for_network(Network::Mainnet, None),
            Err(ConfigError::HotfixNotDeployed("mainnet".to_string()))
        );
        let hotfix = Address([0x42; 20]);
        let mainnet = Deployment::for_network(Network::Mainnet, Some(hotfix)).unwrap();
        assert_eq!(mainnet.hotfix, hotfix);
        assert_eq!(mainnet.storage.to_checksum(), "0x1d8f8f00cfa6758d7bE78336684788Fb0ee0Fa46");
    }

    #[test]
    fn test_missing_endpoint() {
        let deployment = Deployment::for_network(Network::Goerli, None).unwrap();
        assert!(matches!(
            AuditConfig::new(deployment, "  ", Duration::from_secs(1)),
            Err(ConfigError::MissingEndpoint)
        ));
    }

    #[test]
    fn test_log_filter_respects_directives() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
        assert_eq!(log_filter(Some("hotfix_verify=trace")).to_string(), "hotfix_verify=trace");
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("hotfix_verify=loud")).to_string(), "info");
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv_from(&dir.path().join(".env")).unwrap(), None);
    }

    #[test]
    fn test_env_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "HOTFIX_VERIFY_DOTENV_LOADED=yes\n").unwrap();

        assert_eq!(load_dotenv_from(&path).unwrap(), Some(path.clone()));
        assert_eq!(std::env::var("HOTFIX_VERIFY_DOTENV_LOADED").as_deref(), Ok("yes"));
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ETH_RPC=\"http://localhost:8545\n").unwrap();

        let err = load_dotenv_from(&path).unwrap_err();
        assert!(!err.not_found());
    }
}
