//! Ledger Reader
//!
//! The read-only boundary the audit depends on. `LedgerReader` exposes the
//! node and minipool reads, `RemediationSource` the published hotfix list.
//! `RpcLedger` and `HotfixContract` implement them against a live chain:
//! contract addresses and ABIs are resolved by name through the storage
//! registry, then queried with `eth_call`.

use crate::abi::{self, InterfaceDescriptor, Token};
use crate::error::{LedgerError, Result};
use crate::rpc_client::EthRpcClient;
use crate::types::{Address, Correction, MinipoolStatus};
use async_trait::async_trait;
use num_bigint::BigUint;
use std::sync::Arc;

/// Registry name of the node manager contract
pub const NODE_MANAGER: &str = "rocketNodeManager";
/// Registry name of the minipool manager contract
pub const MINIPOOL_MANAGER: &str = "rocketMinipoolManager";

const STORAGE_SIGNATURES: &[&str] = &["getAddress(bytes32)", "getString(bytes32)", "getUint(bytes32)"];
const MINIPOOL_SIGNATURES: &[&str] = &["getNodeFee()", "getStatus()"];
const HOTFIX_SIGNATURES: &[&str] = &["errorCount()", "errors(uint256)"];

/// Node and minipool reads needed to recompute fee numerators
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn node_count(&self) -> Result<u64>;
    async fn node_at(&self, index: u64) -> Result<Address>;
    async fn fee_distributor_initialised(&self, node: &Address) -> Result<bool>;
    /// Cached value from the storage contract
    async fn node_fee_numerator(&self, node: &Address) -> Result<BigUint>;
    async fn node_minipool_count(&self, node: &Address) -> Result<u64>;
    async fn node_minipool_at(&self, node: &Address, index: u64) -> Result<Address>;
    async fn minipool_status(&self, minipool: &Address) -> Result<MinipoolStatus>;
    async fn minipool_node_fee(&self, minipool: &Address) -> Result<BigUint>;
}

/// Externally published list of corrections
#[async_trait]
pub trait RemediationSource: Send + Sync {
    async fn error_count(&self) -> Result<u64>;
    async fn error_at(&self, index: u64) -> Result<Correction>;
}

/// A contract resolved from the storage registry
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    pub name: String,
    pub address: Address,
    pub interface: InterfaceDescriptor,
}

/// Encode, `eth_call`, and return the raw return data
pub async fn call_contract(
    rpc: &EthRpcClient,
    address: &Address,
    interface: &InterfaceDescriptor,
    method: &str,
    args: &[Token],
) -> Result<Vec<u8>> {
    let data = interface.function(method)?.encode_call(args)?;
    rpc.eth_call(address, &data).await
}

/// The generic key-value storage contract that also serves as the name registry
pub struct RocketStorage {
    rpc: Arc<EthRpcClient>,
    address: Address,
    interface: InterfaceDescriptor,
}

impl RocketStorage {
    pub fn new(rpc: Arc<EthRpcClient>, address: Address) -> Result<Self> {
        Ok(Self {
            rpc,
            address,
            interface: InterfaceDescriptor::from_signatures(STORAGE_SIGNATURES)?,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    async fn get(&self, method: &str, key: [u8; 32]) -> Result<Vec<u8>> {
        call_contract(&self.rpc, &self.address, &self.interface, method, &[Token::FixedBytes(key)]).await
    }

    pub async fn get_address(&self, key: [u8; 32]) -> Result<Address> {
        abi::decode_address(&self.get("getAddress", key).await?)
    }

    pub async fn get_string(&self, key: [u8; 32]) -> Result<String> {
        abi::decode_string(&self.get("getString", key).await?)
    }

    pub async fn get_uint(&self, key: [u8; 32]) -> Result<BigUint> {
        abi::decode_uint256(&self.get("getUint", key).await?)
    }

    /// Look up a contract's address and compressed ABI by registry name
    pub async fn resolve_contract(&self, name: &str) -> Result<ResolvedContract> {
        let (address, encoded_abi) = futures::try_join!(
            self.get_address(abi::contract_address_key(name)),
            self.get_string(abi::contract_abi_key(name)),
        )?;

        if address.is_zero() {
            return Err(LedgerError::Resolution(name.to_string()));
        }

        let interface = InterfaceDescriptor::from_compressed(&encoded_abi)?;
        tracing::debug!(contract = name, %address, functions = interface.functions().len(), "resolved contract");

        Ok(ResolvedContract {
            name: name.to_string(),
            address,
            interface,
        })
    }
}

/// `LedgerReader` backed by a JSON-RPC endpoint
pub struct RpcLedger {
    rpc: Arc<EthRpcClient>,
    storage: RocketStorage,
    node_manager: ResolvedContract,
    minipool_manager: ResolvedContract,
    minipool_interface: InterfaceDescriptor,
}

impl RpcLedger {
    /// Resolve the manager contracts; fails if either is unregistered
    pub async fn connect(rpc: Arc<EthRpcClient>, storage_address: Address) -> Result<Self> {
        let storage = RocketStorage::new(rpc.clone(), storage_address)?;
        let (node_manager, minipool_manager) = futures::try_join!(
            storage.resolve_contract(NODE_MANAGER),
            storage.resolve_contract(MINIPOOL_MANAGER),
        )?;

        Ok(Self {
            rpc,
            storage,
            node_manager,
            minipool_manager,
            minipool_interface: InterfaceDescriptor::from_signatures(MINIPOOL_SIGNATURES)?,
        })
    }

    pub fn storage(&self) -> &RocketStorage {
        &self.storage
    }

    pub fn node_manager(&self) -> &ResolvedContract {
        &self.node_manager
    }

    pub fn minipool_manager(&self) -> &ResolvedContract {
        &self.minipool_manager
    }

    async fn call(&self, contract: &ResolvedContract, method: &str, args: &[Token]) -> Result<Vec<u8>> {
        call_contract(&self.rpc, &contract.address, &contract.interface, method, args).await
    }

    async fn call_minipool(&self, minipool: &Address, method: &str) -> Result<Vec<u8>> {
        call_contract(&self.rpc, minipool, &self.minipool_interface, method, &[]).await
    }
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn node_count(&self) -> Result<u64> {
        abi::decode_u64(&self.call(&self.node_manager, "getNodeCount", &[]).await?)
    }

    async fn node_at(&self, index: u64) -> Result<Address> {
        abi::decode_address(&self.call(&self.node_manager, "getNodeAt", &[Token::Uint(index)]).await?)
    }

    async fn fee_distributor_initialised(&self, node: &Address) -> Result<bool> {
        let data = self
            .call(&self.node_manager, "getFeeDistributorInitialised", &[Token::Address(*node)])
            .await?;
        abi::decode_bool(&data)
    }

    async fn node_fee_numerator(&self, node: &Address) -> Result<BigUint> {
        self.storage.get_uint(abi::node_fee_numerator_key(node)).await
    }

    async fn node_minipool_count(&self, node: &Address) -> Result<u64> {
        let data = self
            .call(&self.minipool_manager, "getNodeMinipoolCount", &[Token::Address(*node)])
            .await?;
        abi::decode_u64(&data)
    }

    async fn node_minipool_at(&self, node: &Address, index: u64) -> Result<Address> {
        let data = self
            .call(
                &self.minipool_manager,
                "getNodeMinipoolAt",
                &[Token::Address(*node), Token::Uint(index)],
            )
            .await?;
        abi::decode_address(&data)
    }

    async fn minipool_status(&self, minipool: &Address) -> Result<MinipoolStatus> {
        Ok(MinipoolStatus::from(abi::decode_u8(&self.call_minipool(minipool, "getStatus").await?)?))
    }

    async fn minipool_node_fee(&self, minipool: &Address) -> Result<BigUint> {
        abi::decode_uint256(&self.call_minipool(minipool, "getNodeFee").await?)
    }
}

/// The deployed hotfix contract listing per-node corrections
pub struct HotfixContract {
    rpc: Arc<EthRpcClient>,
    address: Address,
    interface: InterfaceDescriptor,
}

impl HotfixContract {
    pub fn new(rpc: Arc<EthRpcClient>, address: Address) -> Result<Self> {
        Ok(Self {
            rpc,
            address,
            interface: InterfaceDescriptor::from_signatures(HOTFIX_SIGNATURES)?,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

#[async_trait]
impl RemediationSource for HotfixContract {
    async fn error_count(&self) -> Result<u64> {
        let data = call_contract(&self.rpc, &self.address, &self.interface, "errorCount", &[]).await?;
        abi::decode_u64(&data)
    }

    async fn error_at(&self, index: u64) -> Result<Correction> {
        let data = call_contract(&self.rpc, &self.address, &self.interface, "errors", &[Token::Uint(index)]).await?;
        abi::decode_correction(&data)
    }
}
