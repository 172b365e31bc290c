/// Content hashing for change detection
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a byte payload
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("{:x}", result)
}
