//! # Tribunal Crypto
//!
//! Commitment engine for reasoning trees.
//!
//! A proposer commits to the full node set of a reasoning tree via a
//! Merkle root over canonical node hashes. Challenged branches can then
//! be verified in O(log n) against the committed root without shipping
//! the whole tree.

pub mod canonical;
pub mod hash;
pub mod merkle;

pub use canonical::{canonical_json, node_hash};
pub use hash::{combine_hex, sha256_hex};
pub use merkle::{CommitmentTree, ProofSide, ProofStep};
