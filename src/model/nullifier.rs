use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};

use crate::model::vote::Nullifier;

/// Derive a voter's nullifier as the lowercase hex SHA-256 of their ID.
///
/// This is a stable pseudonym, not a proof of eligibility: anyone who knows
/// the voter ID can compute it.
pub fn derive_nullifier(voter_id: &str) -> Nullifier {
    let digest = Sha256::digest(voter_id.as_bytes());
    Nullifier::new(HEXLOWER.encode(&digest))
}
