use sha2::{Digest, Sha256};

/// SHA-256 of `text` as 64 lowercase hex characters.
#[must_use]
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
