//! Deterministic identities for runs: config hash, dataset hash, run id.
//!
//! All hashes are BLAKE3 hex digests, stable across builds and platforms.

use crate::config::PairConfig;

/// Hash of the canonical JSON form of a config.
pub fn config_hash(config: &PairConfig) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(config)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Hash of both price histories, bit-exact.
pub fn dataset_hash(prices_a: &[f64], prices_b: &[f64]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(prices_a.len() as u64).to_le_bytes());
    for p in prices_a {
        hasher.update(&p.to_le_bytes());
    }
    hasher.update(&(prices_b.len() as u64).to_le_bytes());
    for p in prices_b {
        hasher.update(&p.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Run id: config hash combined with dataset hash.
pub fn run_id(config_hash: &str, dataset_hash: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(config_hash.as_bytes());
    hasher.update(b"+");
    hasher.update(dataset_hash.as_bytes());
    hasher.finalize().to_hex().to_string()
}
