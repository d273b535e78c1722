use serde_json::json;
use tribunal_core::ReasoningNode;

use crate::hash::sha256_hex;

/// Canonical serialization of a node's persistent fields.
///
/// Object keys are lexicographic (serde_json's default map ordering) and
/// separators carry no incidental whitespace, so equal nodes produce
/// byte-identical output across implementations. Absent options encode
/// as `null`; node kinds encode as snake_case strings.
pub fn canonical_json(node: &ReasoningNode) -> String {
    json!({
        "children": node.children,
        "claim": node.claim,
        "evidence": node.evidence,
        "id": node.id,
        "kind": node.kind,
    })
    .to_string()
}

/// Canonical hash of a reasoning node: SHA-256 over the canonical form.
pub fn node_hash(node: &ReasoningNode) -> String {
    sha256_hex(canonical_json(node).as_bytes())
}
