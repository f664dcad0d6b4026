//! Strong type definitions for the commit core.
//!
//! All identifiers are newtypes to prevent misuse at compile time. Every
//! identifier is `Ord` so that maps keyed by it can be `BTreeMap`s, which
//! keeps iteration order independent of insertion order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A message sequence number, assigned per source chain.
pub type SeqNum = u64;

/// A token or gas price. Zero is never a valid observed price.
pub type Price = u128;

/// Opaque identifier of a source or destination chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainSelector(pub u64);

impl ChainSelector {
    pub const fn new(selector: u64) -> Self {
        Self(selector)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain({})", self.0)
    }
}

impl fmt::Display for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainSelector {
    fn from(selector: u64) -> Self {
        Self(selector)
    }
}

/// Index of an oracle node within the network.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OracleId(pub u8);

impl fmt::Debug for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oracle({})", self.0)
    }
}

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for OracleId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

/// 32 opaque bytes: message IDs, message hashes and merkle roots.
///
/// Ordering is lexicographic over the raw bytes. Plurality votes rely on
/// this ordering to break ties.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// All zeroes; the root of an empty tree.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Bytes32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Bytes32 {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Globally unique message identifier, computed on the source chain.
pub type MessageId = Bytes32;

/// Hash of a message body, computed by the observing node.
pub type MessageHash = Bytes32;

/// Inclusive sequence number bounds of a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub min: SeqNum,
    pub max: SeqNum,
}

impl Interval {
    /// Create an interval, or `None` when `min > max`.
    pub fn new(min: SeqNum, max: SeqNum) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// Number of sequence numbers covered.
    pub fn len(&self) -> u64 {
        (self.max - self.min).saturating_add(1)
    }

    /// Intervals are never empty once constructed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, seq_num: SeqNum) -> bool {
        self.min <= seq_num && seq_num <= self.max
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A message observed on a source chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub seq_num: SeqNum,
    pub id: MessageId,
    pub hash: MessageHash,
}

impl Message {
    pub fn new(seq_num: SeqNum, id: MessageId, hash: MessageHash) -> Self {
        Self { seq_num, id, hash }
    }
}

/// A commitment to a contiguous run of messages on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    pub interval: Interval,
    pub root: Bytes32,
}
