use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::MIN_PROPOSER_STAKE;
use crate::error::TreeError;

/// Kinds of nodes in a reasoning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Conclusion,
    Premise,
    SubPremise,
    Rebuttal,
    Qualifier,
}

/// Kinds of challenges that can be mounted against a reasoning node.
///
/// Each kind carries a payout multiplier scaling the challenger's reward
/// by the severity of the asserted defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    FactualError,
    LogicalFallacy,
    MissingContext,
    Contradiction,
    Outdated,
}

impl AttackKind {
    /// Payout multiplier for this attack kind. Part of the public
    /// protocol contract.
    pub fn multiplier(&self) -> f64 {
        match self {
            AttackKind::FactualError => 2.0,
            AttackKind::LogicalFallacy => 2.5,
            AttackKind::MissingContext => 1.5,
            AttackKind::Contradiction => 3.0,
            AttackKind::Outdated => 1.5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttackKind::FactualError => "factual_error",
            AttackKind::LogicalFallacy => "logical_fallacy",
            AttackKind::MissingContext => "missing_context",
            AttackKind::Contradiction => "contradiction",
            AttackKind::Outdated => "outdated",
        }
    }
}

/// Kinds of defenses a proposer can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseKind {
    /// Counter-evidence provided.
    Refute,
    /// Accept the challenge, limit the damage.
    Concede,
    /// Accept part, contest the rest.
    Partial,
}

/// Validator verdicts on a disputed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    ChallengeUpheld,
    ChallengeRejected,
    Partial,
    Abstain,
}

/// Supporting evidence attached to a node, challenge or defense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Label of the source (publication, dataset, chain record...).
    pub source: String,
    /// The evidence payload itself.
    pub content: String,
    pub url: Option<String>,
    /// Unix seconds at which the evidence was retrieved.
    pub retrieved_at: Option<u64>,
}

/// A single node of a reasoning tree.
///
/// The persistent fields (`id`, `claim`, `kind`, `evidence`, `children`)
/// are exactly the fields covered by the Merkle commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningNode {
    pub id: String,
    pub claim: String,
    pub kind: NodeKind,
    pub evidence: Option<Evidence>,
    /// Ordered identifiers of child nodes within the same tree.
    pub children: Vec<String>,
}

impl ReasoningNode {
    pub fn new(id: impl Into<String>, claim: impl Into<String>, kind: NodeKind) -> Self {
        Self { id: id.into(), claim: claim.into(), kind, evidence: None, children: Vec::new() }
    }

    pub fn with_children(mut self, children: Vec<String>) -> Self {
        self.children = children;
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// A proposer-submitted reasoning artifact: a distinguished root claim
/// plus its supporting node set, committed to via a Merkle root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTree {
    pub task_id: String,
    pub root: ReasoningNode,
    /// Non-root nodes, in commitment order.
    pub nodes: Vec<ReasoningNode>,
    /// Hex Merkle root over the canonical node set.
    pub merkle_root: String,
    /// Stake the proposer posted behind this tree.
    pub stake: f64,
    pub proposer: String,
    /// Unix seconds at which the tree was accepted.
    pub submitted_at: u64,
}

impl ReasoningTree {
    /// All nodes in commitment order: root first, then the listed nodes.
    pub fn all_nodes(&self) -> impl Iterator<Item = &ReasoningNode> {
        std::iter::once(&self.root).chain(self.nodes.iter())
    }

    /// Look up a node by identifier anywhere in the tree.
    pub fn find_node(&self, id: &str) -> Option<&ReasoningNode> {
        self.all_nodes().find(|n| n.id == id)
    }

    pub fn node_count(&self) -> usize {
        1 + self.nodes.len()
    }

    /// Structural validation of an incoming tree.
    ///
    /// Checks identifier uniqueness, child-reference resolution, absence
    /// of cycles, presence of a commitment and the minimum proposer stake.
    /// Commitment *correctness* is the commitment engine's job.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.merkle_root.is_empty() {
            return Err(TreeError::MissingCommitment);
        }
        if self.stake < MIN_PROPOSER_STAKE {
            return Err(TreeError::StakeBelowMinimum {
                provided: self.stake,
                required: MIN_PROPOSER_STAKE,
            });
        }

        let mut ids = HashSet::new();
        for node in self.all_nodes() {
            if !ids.insert(node.id.as_str()) {
                return Err(TreeError::DuplicateNodeId(node.id.clone()));
            }
        }
        for node in self.all_nodes() {
            for child in &node.children {
                if !ids.contains(child.as_str()) {
                    return Err(TreeError::UnknownChild {
                        node: node.id.clone(),
                        child: child.clone(),
                    });
                }
            }
        }
        self.check_acyclic()
    }

    /// Depth-first cycle detection over child edges.
    fn check_acyclic(&self) -> Result<(), TreeError> {
        // 0 = unvisited, 1 = on the current path, 2 = done
        let mut state: std::collections::HashMap<&str, u8> =
            self.all_nodes().map(|n| (n.id.as_str(), 0u8)).collect();

        for start in self.all_nodes() {
            if state[start.id.as_str()] != 0 {
                continue;
            }
            // Explicit stack: (node_id, entered)
            let mut stack: Vec<(&str, bool)> = vec![(start.id.as_str(), false)];
            while let Some((id, entered)) = stack.pop() {
                if entered {
                    state.insert(id, 2);
                    continue;
                }
                match state[id] {
                    1 => return Err(TreeError::CycleDetected(id.to_string())),
                    2 => continue,
                    _ => {}
                }
                state.insert(id, 1);
                stack.push((id, true));
                if let Some(node) = self.find_node(id) {
                    for child in &node.children {
                        match state[child.as_str()] {
                            1 => return Err(TreeError::CycleDetected(child.clone())),
                            0 => stack.push((child.as_str(), false)),
                            _ => {}
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A challenger's attack on a specific node of a committed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSubmission {
    pub task_id: String,
    pub target_node_id: String,
    pub attack: AttackKind,
    /// The challenger's argument for why the node is defective.
    pub argument: String,
    pub evidence: Option<Evidence>,
    /// Stake the challenger puts at risk.
    pub stake: f64,
    pub challenger: String,
}

/// A proposer's defense of a challenged node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseSubmission {
    pub kind: DefenseKind,
    pub argument: String,
    pub evidence: Option<Evidence>,
}
