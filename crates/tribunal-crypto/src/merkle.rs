use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tribunal_core::{ReasoningNode, ReasoningTree};

use crate::canonical::node_hash;
use crate::hash::{combine_hex, sha256_hex};

/// Which side of the running value a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofSide {
    Left,
    Right,
}

/// One step of an inclusion proof, leaf to root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Hex hash of the sibling at this level.
    pub sibling: String,
    pub side: ProofSide,
}

/// Merkle commitment over a reasoning tree's node set.
///
/// Leaves are canonical node hashes in commitment order (root node first,
/// then the listed non-root nodes). Levels with an odd count duplicate
/// their last element before pairing. The store is read-only once built.
pub struct CommitmentTree {
    root: String,
    proofs: HashMap<String, Vec<ProofStep>>,
}

impl CommitmentTree {
    /// Commit to a reasoning tree's full node set.
    pub fn build(tree: &ReasoningTree) -> Self {
        Self::from_nodes(tree.all_nodes())
    }

    /// Commit to an arbitrary ordered node set.
    pub fn from_nodes<'a>(nodes: impl Iterator<Item = &'a ReasoningNode>) -> Self {
        let leaves: Vec<(String, String)> =
            nodes.map(|n| (n.id.clone(), node_hash(n))).collect();

        if leaves.is_empty() {
            return Self { root: sha256_hex(b""), proofs: HashMap::new() };
        }

        // Build every level bottom-up, padding odd levels by duplicating
        // the last element so each position always has a sibling.
        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = leaves.iter().map(|(_, h)| h.clone()).collect();
        while current.len() > 1 {
            if current.len() % 2 == 1 {
                current.push(current[current.len() - 1].clone());
            }
            levels.push(current.clone());
            current = current
                .chunks(2)
                .map(|pair| combine_hex(&pair[0], &pair[1]))
                .collect();
        }
        let root = current[0].clone();

        let proofs = leaves
            .iter()
            .enumerate()
            .map(|(index, (id, _))| (id.clone(), Self::proof_at(&levels, index)))
            .collect();

        Self { root, proofs }
    }

    /// Walk the padded levels collecting the sibling at each step.
    fn proof_at(levels: &[Vec<String>], leaf_index: usize) -> Vec<ProofStep> {
        let mut proof = Vec::with_capacity(levels.len());
        let mut index = leaf_index;
        for level in levels {
            let sibling_index = index ^ 1;
            let side = if index % 2 == 0 { ProofSide::Right } else { ProofSide::Left };
            proof.push(ProofStep { sibling: level[sibling_index].clone(), side });
            index /= 2;
        }
        proof
    }

    /// The committed root, as lowercase hex.
    pub fn root_hex(&self) -> &str {
        &self.root
    }

    /// Inclusion proof for a node, leaf to root.
    ///
    /// An unknown identifier yields an empty proof; callers must treat
    /// that as "absent", not as a proof of anything.
    pub fn proof_for(&self, node_id: &str) -> Vec<ProofStep> {
        self.proofs.get(node_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.proofs.contains_key(node_id)
    }

    pub fn leaf_count(&self) -> usize {
        self.proofs.len()
    }

    /// Verify an inclusion proof for a node against an expected root.
    ///
    /// Total: never errors. Folds the proof from the node's canonical
    /// hash and compares the final value with the expected root.
    pub fn verify(node: &ReasoningNode, proof: &[ProofStep], expected_root: &str) -> bool {
        let mut current = node_hash(node);
        for step in proof {
            current = match step.side {
                ProofSide::Left => combine_hex(&step.sibling, &current),
                ProofSide::Right => combine_hex(&current, &step.sibling),
            };
        }
        current == expected_root
    }

    /// Recompute the commitment for a tree's node set and compare it with
    /// the root the tree declares. Used when accepting submissions.
    pub fn verify_commitment(tree: &ReasoningTree) -> bool {
        Self::build(tree).root == tree.merkle_root
    }
}
