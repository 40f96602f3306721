//! In-memory ledger fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use hotfix_verify::error::{LedgerError, Result};
use hotfix_verify::{Address, Correction, LedgerReader, MinipoolStatus, RemediationSource};
use num_bigint::{BigInt, BigUint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const STAKING: u8 = 2;
pub const PRELAUNCH: u8 = 1;
pub const WITHDRAWABLE: u8 = 3;

pub fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

pub fn int(v: i64) -> BigInt {
    BigInt::from(v)
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub address: Address,
    pub initialised: bool,
    pub cached: BigUint,
    pub minipools: Vec<Address>,
}

/// A fixed chain state
#[derive(Debug, Default)]
pub struct FakeLedger {
    pub nodes: Vec<FakeNode>,
    pub minipools: HashMap<Address, (u8, BigUint)>,
    /// `node_at(i)` fails for this index
    pub fail_node_at: Option<u64>,
    /// Status and fee reads fail for this minipool
    pub fail_minipool: Option<Address>,
    next_minipool: u32,
    pub fee_reads: AtomicUsize,
    pub numerator_reads: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with `(status, fee)` minipools
    pub fn node(mut self, address: Address, initialised: bool, cached: u64, minipools: &[(u8, u64)]) -> Self {
        let mut addresses = Vec::with_capacity(minipools.len());
        for (status, fee) in minipools {
            self.next_minipool += 1;
            let mut bytes = [0xee; 20];
            bytes[16..].copy_from_slice(&self.next_minipool.to_be_bytes());
            let minipool = Address(bytes);
            self.minipools.insert(minipool, (*status, BigUint::from(*fee)));
            addresses.push(minipool);
        }
        self.nodes.push(FakeNode {
            address,
            initialised,
            cached: BigUint::from(cached),
            minipools: addresses,
        });
        self
    }

    pub fn with_cached(mut self, address: Address, cached: BigUint) -> Self {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.address == address) {
            node.cached = cached;
        }
        self
    }

    /// Address of the `index`th minipool of the `node`th registered node
    pub fn minipool_of(&self, node: usize, index: usize) -> Address {
        self.nodes[node].minipools[index]
    }

    fn find(&self, node: &Address) -> Result<&FakeNode> {
        self.nodes
            .iter()
            .find(|n| n.address == *node)
            .ok_or_else(|| LedgerError::transport(format!("unknown node {}", node)))
    }

    fn minipool(&self, minipool: &Address) -> Result<&(u8, BigUint)> {
        if self.fail_minipool == Some(*minipool) {
            return Err(LedgerError::transport(format!("minipool {} read timed out", minipool)));
        }
        self.minipools
            .get(minipool)
            .ok_or_else(|| LedgerError::transport(format!("unknown minipool {}", minipool)))
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn node_count(&self) -> Result<u64> {
        Ok(self.nodes.len() as u64)
    }

    async fn node_at(&self, index: u64) -> Result<Address> {
        if self.fail_node_at == Some(index) {
            return Err(LedgerError::transport("connection reset"));
        }
        self.nodes
            .get(index as usize)
            .map(|n| n.address)
            .ok_or_else(|| LedgerError::transport(format!("node index {} out of range", index)))
    }

    async fn fee_distributor_initialised(&self, node: &Address) -> Result<bool> {
        Ok(self.find(node)?.initialised)
    }

    async fn node_fee_numerator(&self, node: &Address) -> Result<BigUint> {
        self.numerator_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(node)?.cached.clone())
    }

    async fn node_minipool_count(&self, node: &Address) -> Result<u64> {
        Ok(self.find(node)?.minipools.len() as u64)
    }

    async fn node_minipool_at(&self, node: &Address, index: u64) -> Result<Address> {
        self.find(node)?
            .minipools
            .get(index as usize)
            .copied()
            .ok_or_else(|| LedgerError::transport(format!("minipool index {} out of range", index)))
    }

    async fn minipool_status(&self, minipool: &Address) -> Result<MinipoolStatus> {
        Ok(MinipoolStatus::from(self.minipool(minipool)?.0))
    }

    async fn minipool_node_fee(&self, minipool: &Address) -> Result<BigUint> {
        self.fee_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.minipool(minipool)?.1.clone())
    }
}

/// A published correction list
#[derive(Debug, Default)]
pub struct FakeHotfix {
    pub corrections: Vec<Correction>,
    pub fail_at: Option<u64>,
}

impl FakeHotfix {
    pub fn new(entries: &[(Address, i64)]) -> Self {
        Self {
            corrections: entries.iter().map(|(a, v)| Correction::new(*a, int(*v))).collect(),
            fail_at: None,
        }
    }
}

#[async_trait]
impl RemediationSource for FakeHotfix {
    async fn error_count(&self) -> Result<u64> {
        Ok(self.corrections.len() as u64)
    }

    async fn error_at(&self, index: u64) -> Result<Correction> {
        if self.fail_at == Some(index) {
            return Err(LedgerError::transport("timeout"));
        }
        self.corrections
            .get(index as usize)
            .cloned()
            .ok_or_else(|| LedgerError::transport(format!("error index {} out of range", index)))
    }
}
