//! Content-addressed identifiers for facts.
//!
//! An id is the SHA-1 digest of the concatenated textual rendering of an
//! ordered tuple of fields, truncated to 64 bits and hex encoded. The same
//! tuple produces the same id in every process, which is what lets
//! independent ingestion runs be merged by plain set union.

use std::fmt::Display;

use sha1::{Digest, Sha1};

/// Number of digest bytes kept (16 hex characters)
const ID_BYTES: usize = 8;

pub fn stable_id(parts: &[&dyn Display]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.to_string().as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..ID_BYTES])
}
