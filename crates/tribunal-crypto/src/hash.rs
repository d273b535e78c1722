use sha2::{Digest, Sha256};

/// SHA-256 of a byte sequence, as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Combine two hex digests into a parent digest.
///
/// Parents hash the *textual* concatenation of the child hex strings,
/// so digests stay printable end to end.
pub fn combine_hex(left: &str, right: &str) -> String {
    let mut combined = String::with_capacity(left.len() + right.len());
    combined.push_str(left);
    combined.push_str(right);
    sha256_hex(combined.as_bytes())
}
