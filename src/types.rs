//! Core data model: addresses, minipool status, discrepancy and correction records.

use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account or contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// Error returned when parsing an address from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {0:?}: expected 0x followed by 40 hex digits")]
pub struct ParseAddressError(pub String);

impl FromStr for Address {
    type Err = ParseAddressError;

    /// Accepts any letter case; checksums are not enforced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.len() != 40 {
            return Err(ParseAddressError(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

/// Minipool lifecycle status as reported by `getStatus()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinipoolStatus {
    Initialised,
    Prelaunch,
    Staking,
    Withdrawable,
    Dissolved,
    Unknown(u8),
}

impl MinipoolStatus {
    /// Only staking minipools contribute to a node's fee numerator
    pub const STAKING_TAG: u8 = 2;

    pub fn is_staking(&self) -> bool {
        matches!(self, MinipoolStatus::Staking)
    }

    pub fn tag(&self) -> u8 {
        match self {
            MinipoolStatus::Initialised => 0,
            MinipoolStatus::Prelaunch => 1,
            MinipoolStatus::Staking => Self::STAKING_TAG,
            MinipoolStatus::Withdrawable => 3,
            MinipoolStatus::Dissolved => 4,
            MinipoolStatus::Unknown(tag) => *tag,
        }
    }
}

impl From<u8> for MinipoolStatus {
    fn from(tag: u8) -> Self {
        match tag {
            0 => MinipoolStatus::Initialised,
            1 => MinipoolStatus::Prelaunch,
            2 => MinipoolStatus::Staking,
            3 => MinipoolStatus::Withdrawable,
            4 => MinipoolStatus::Dissolved,
            other => MinipoolStatus::Unknown(other),
        }
    }
}

/// A node whose cached fee numerator differs from the recomputed one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub address: Address,
    /// `expected - cached`; never zero
    #[serde(serialize_with = "serialize_decimal")]
    pub difference: BigInt,
    /// Set by cross-validation when an identical correction is found
    pub verified: bool,
}

impl Discrepancy {
    pub fn new(address: Address, difference: BigInt) -> Self {
        Self {
            address,
            difference,
            verified: false,
        }
    }
}

/// An entry of the published hotfix error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub address: Address,
    #[serde(serialize_with = "serialize_decimal")]
    pub amount: BigInt,
}

impl Correction {
    pub fn new(address: Address, amount: BigInt) -> Self {
        Self { address, amount }
    }
}

pub(crate) fn serialize_decimal<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
