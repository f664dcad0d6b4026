//! Hashing primitives injected into observation building and reduction.
//!
//! The reducer never hashes on its own; it is handed a [`MerkleBuilder`].
//! The observation builder is handed a [`MessageHasher`]. Both default to
//! Blake3-based implementations.

use crate::types::{Bytes32, ChainSelector, MessageHash, MessageId, SeqNum};

/// Domain tag for message hashes.
const MESSAGE_DOMAIN: &[u8] = b"xchain-commit-msg-v0:";

/// Prefix for merkle leaves.
const LEAF_PREFIX: u8 = 0x00;

/// Prefix for internal merkle nodes.
const NODE_PREFIX: u8 = 0x01;

/// Computes the hash that is voted on and committed for a message.
pub trait MessageHasher: Send + Sync {
    fn hash_message(
        &self,
        source_chain: ChainSelector,
        seq_num: SeqNum,
        id: &MessageId,
        payload: &[u8],
    ) -> MessageHash;
}

/// Builds a root over an ordered list of leaf hashes.
///
/// Must be deterministic and order-sensitive.
pub trait MerkleBuilder: Send + Sync {
    fn build_root(&self, leaves: &[Bytes32]) -> Bytes32;
}

/// Blake3 over the domain tag, chain, sequence number, id and payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3MessageHasher;

impl MessageHasher for Blake3MessageHasher {
    fn hash_message(
        &self,
        source_chain: ChainSelector,
        seq_num: SeqNum,
        id: &MessageId,
        payload: &[u8],
    ) -> MessageHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(MESSAGE_DOMAIN);
        hasher.update(&source_chain.as_u64().to_be_bytes());
        hasher.update(&seq_num.to_be_bytes());
        hasher.update(id.as_bytes());
        hasher.update(payload);
        Bytes32(*hasher.finalize().as_bytes())
    }
}

/// Binary Blake3 merkle tree.
///
/// Leaves are hashed as `H(0x00 || leaf)`, internal nodes as
/// `H(0x01 || left || right)`. An odd node at the end of a level is
/// promoted unchanged. The empty tree has the zero root.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3MerkleBuilder;

impl Blake3MerkleBuilder {
    fn hash_leaf(leaf: &Bytes32) -> Bytes32 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[LEAF_PREFIX]);
        hasher.update(leaf.as_bytes());
        Bytes32(*hasher.finalize().as_bytes())
    }

    fn hash_node(left: &Bytes32, right: &Bytes32) -> Bytes32 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[NODE_PREFIX]);
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Bytes32(*hasher.finalize().as_bytes())
    }
}

impl MerkleBuilder for Blake3MerkleBuilder {
    fn build_root(&self, leaves: &[Bytes32]) -> Bytes32 {
        if leaves.is_empty() {
            return Bytes32::ZERO;
        }

        let mut level: Vec<Bytes32> = leaves.iter().map(Self::hash_leaf).collect();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => Self::hash_node(left, right),
                    _ => pair[0],
                })
                .collect();
        }
        level[0]
    }
}
