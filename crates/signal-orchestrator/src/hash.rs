use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical JSON serialization of a report body.
///
/// Canonical means stable key ordering: serializing through
/// `serde_json::Value` routes every map through a BTreeMap, so keys come out
/// lexicographically sorted regardless of struct field order. The hash is an
/// idempotent report identifier, not a cryptographic commitment.
pub fn content_hash<T: Serialize>(body: &T) -> String {
    match serde_json::to_value(body) {
        Ok(value) => sha256_hex(value.to_string().as_bytes()),
        Err(e) => {
            // Serialization itself failed; fall back to a timestamp hash so
            // the report still carries a usable identifier.
            tracing::warn!(error = %e, "report canonicalization failed, hashing timestamp");
            sha256_hex(Utc::now().to_rfc3339().as_bytes())
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
