//! Contract ABI helpers
//!
//! Just enough of the Solidity ABI to read the values the audit needs:
//! keccak-256 storage keys, function selectors, 32-byte word encoding of
//! call arguments, and typed decoding of return data. Interface descriptors
//! are stored on chain as base64-encoded, zlib-compressed JSON ABIs.

use crate::error::{LedgerError, Result};
use crate::types::{Address, Correction};
use base64::{engine::general_purpose, Engine as _};
use flate2::read::ZlibDecoder;
use num_bigint::{BigInt, BigUint};
use serde::Deserialize;
use sha3::{Digest, Keccak256};
use std::io::Read;

/// Size of one ABI word in bytes
pub const WORD: usize = 32;

/// Storage namespace for registered contract addresses
pub const CONTRACT_ADDRESS_NS: &str = "contract.address";
/// Storage namespace for registered contract ABIs
pub const CONTRACT_ABI_NS: &str = "contract.abi";
/// Storage namespace for a node's cached average fee numerator
pub const NODE_FEE_NUMERATOR_NS: &str = "node.average.fee.numerator";

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// keccak256(namespace ++ subject), i.e. `keccak256(abi.encodePacked(namespace, subject))`
pub fn storage_key(namespace: &str, subject: &[u8]) -> [u8; 32] {
    let mut packed = Vec::with_capacity(namespace.len() + subject.len());
    packed.extend_from_slice(namespace.as_bytes());
    packed.extend_from_slice(subject);
    keccak256(&packed)
}

pub fn contract_address_key(name: &str) -> [u8; 32] {
    storage_key(CONTRACT_ADDRESS_NS, name.as_bytes())
}

pub fn contract_abi_key(name: &str) -> [u8; 32] {
    storage_key(CONTRACT_ABI_NS, name.as_bytes())
}

/// Packed as the raw 20 address bytes, not a padded word
pub fn node_fee_numerator_key(node: &Address) -> [u8; 32] {
    storage_key(NODE_FEE_NUMERATOR_NS, node.as_bytes())
}

/// A callable function: name plus canonical input types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<String>,
}

impl Function {
    /// Canonical signature, e.g. `getNodeMinipoolAt(address,uint256)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.inputs.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Selector followed by one word per argument
    pub fn encode_call(&self, args: &[Token]) -> Result<Vec<u8>> {
        if args.len() != self.inputs.len() {
            return Err(LedgerError::decode(format!(
                "{} expects {} arguments, got {}",
                self.signature(),
                self.inputs.len(),
                args.len()
            )));
        }
        let mut data = Vec::with_capacity(4 + WORD * args.len());
        data.extend_from_slice(&self.selector());
        for arg in args {
            data.extend_from_slice(&arg.encode());
        }
        Ok(data)
    }
}

/// Static (single word) call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u64),
    FixedBytes([u8; 32]),
}

impl Token {
    pub fn encode(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        match self {
            Token::Address(addr) => word[12..].copy_from_slice(addr.as_bytes()),
            Token::Uint(value) => word[24..].copy_from_slice(&value.to_be_bytes()),
            Token::FixedBytes(bytes) => word.copy_from_slice(bytes),
        }
        word
    }
}

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<AbiParam>,
}

impl AbiParam {
    fn canonical(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self.components.iter().map(AbiParam::canonical).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.kind.clone(),
        }
    }
}

/// Typed call interface of a contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    functions: Vec<Function>,
}

impl InterfaceDescriptor {
    /// Parse a JSON ABI array, keeping only function entries
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<AbiItem> = serde_json::from_str(json)
            .map_err(|e| LedgerError::decode(format!("invalid ABI JSON: {}", e)))?;

        let functions = items
            .into_iter()
            .filter(|item| item.kind.as_deref().unwrap_or("function") == "function")
            .filter_map(|item| {
                let inputs = item.inputs.iter().map(AbiParam::canonical).collect();
                item.name.map(|name| Function { name, inputs })
            })
            .collect();

        Ok(Self { functions })
    }

    /// Decode the on-chain form: base64(zlib(json))
    pub fn from_compressed(encoded: &str) -> Result<Self> {
        let compressed = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| LedgerError::decode(format!("invalid base64 ABI: {}", e)))?;

        let mut json = String::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_string(&mut json)
            .map_err(|e| LedgerError::decode(format!("failed to inflate ABI: {}", e)))?;

        Self::from_json(&json)
    }

    /// Build from human-readable signatures such as `errors(uint256)`
    pub fn from_signatures(signatures: &[&str]) -> Result<Self> {
        let functions = signatures
            .iter()
            .map(|sig| parse_signature(sig))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { functions })
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| LedgerError::decode(format!("interface has no function {}", name)))
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }
}

fn parse_signature(sig: &str) -> Result<Function> {
    let sig = sig.trim();
    let sig = sig.strip_prefix("function ").unwrap_or(sig);
    // Inputs are flat; anything after the first `)` (modifiers, returns) is ignored
    let (open, close) = match sig.find('(').and_then(|o| sig[o..].find(')').map(|c| (o, o + c))) {
        Some(pair) => pair,
        None => return Err(LedgerError::decode(format!("malformed signature {:?}", sig))),
    };
    let name = sig[..open].trim().to_string();
    let args = sig[open + 1..close].trim();
    let inputs = if args.is_empty() {
        Vec::new()
    } else {
        args.split(',').map(|a| a.trim().to_string()).collect()
    };
    Ok(Function { name, inputs })
}

/// Return-data decoders. Each rejects short or non-canonical payloads.
fn word(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD).ok_or_else(|| {
        LedgerError::decode(format!(
            "return data too short: {} bytes, need word {}",
            data.len(),
            index
        ))
    })
}

pub fn decode_uint256(data: &[u8]) -> Result<BigUint> {
    Ok(BigUint::from_bytes_be(word(data, 0)?))
}

pub fn decode_int256_at(data: &[u8], index: usize) -> Result<BigInt> {
    Ok(BigInt::from_signed_bytes_be(word(data, index)?))
}

pub fn decode_u64(data: &[u8]) -> Result<u64> {
    let value = decode_uint256(data)?;
    u64::try_from(&value).map_err(|_| LedgerError::decode(format!("value {} exceeds u64", value)))
}

pub fn decode_u8(data: &[u8]) -> Result<u8> {
    let w = word(data, 0)?;
    if w[..WORD - 1].iter().any(|b| *b != 0) {
        return Err(LedgerError::decode("uint8 word has high bits set"));
    }
    Ok(w[WORD - 1])
}

pub fn decode_bool(data: &[u8]) -> Result<bool> {
    match decode_u8(data)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::decode(format!("invalid bool value {}", other))),
    }
}

pub fn decode_address_at(data: &[u8], index: usize) -> Result<Address> {
    let w = word(data, index)?;
    if w[..12].iter().any(|b| *b != 0) {
        return Err(LedgerError::decode("address word has high bits set"));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&w[12..]);
    Ok(Address(bytes))
}

pub fn decode_address(data: &[u8]) -> Result<Address> {
    decode_address_at(data, 0)
}

pub fn decode_string(data: &[u8]) -> Result<String> {
    let offset = word_as_usize(data, 0)?;
    if offset % WORD != 0 {
        return Err(LedgerError::decode(format!("unaligned string offset {}", offset)));
    }
    let len = word_as_usize(data, offset / WORD)?;
    let start = offset + WORD;
    let bytes = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| LedgerError::decode(format!("string length {} out of bounds", len)))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::decode(format!("string is not UTF-8: {}", e)))
}

/// `(address,int256)` static tuple, as returned by the hotfix `errors(uint256)`
pub fn decode_correction(data: &[u8]) -> Result<Correction> {
    Ok(Correction::new(decode_address_at(data, 0)?, decode_int256_at(data, 1)?))
}

fn word_as_usize(data: &[u8], index: usize) -> Result<usize> {
    let value = BigUint::from_bytes_be(word(data, index)?);
    usize::try_from(&value).map_err(|_| LedgerError::decode(format!("offset {} out of range", value)))
}
