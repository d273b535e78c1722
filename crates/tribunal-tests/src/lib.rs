// Tribunal Tests Library
// This crate contains cross-engine integration tests for Tribunal

pub mod test_utils {
    use tribunal_core::{NodeKind, ReasoningNode, ReasoningTree};
    use tribunal_crypto::CommitmentTree;

    /// Fixed submission instant used across scenarios.
    pub const T0: u64 = 1_700_000_000;

    /// Wire up test logging from `RUST_LOG`; safe to call repeatedly.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    /// Build a small committed reasoning tree for a task.
    pub fn committed_tree(task_id: &str, proposer: &str, stake: f64) -> ReasoningTree {
        let root = ReasoningNode::new("n0", "remote work raises productivity", NodeKind::Conclusion)
            .with_children(vec!["n1".into(), "n2".into()]);
        let mut tree = ReasoningTree {
            task_id: task_id.into(),
            root,
            nodes: vec![
                ReasoningNode::new("n1", "commute time converts to work time", NodeKind::Premise),
                ReasoningNode::new("n2", "fewer interruptions deepen focus", NodeKind::Premise)
                    .with_children(vec!["n3".into()]),
                ReasoningNode::new("n3", "open offices interrupt every 11 minutes", NodeKind::SubPremise),
            ],
            merkle_root: String::new(),
            stake,
            proposer: proposer.into(),
            submitted_at: T0,
        };
        tree.merkle_root = CommitmentTree::build(&tree).root_hex().to_string();
        tree
    }
}
