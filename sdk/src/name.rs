//! Name hashing for name-keyed PDAs

use sha2::{Digest, Sha256};

/// Length of a name digest used as a PDA seed.
pub const NAME_DIGEST_LEN: usize = 32;

/// Hash a human-readable name into the seed used by the task queue and cron
/// job name mappings.
///
/// The full SHA-256 digest is used at every call site so that addresses
/// derived for the same name always agree.
pub fn hash_name(name: &str) -> [u8; NAME_DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.finalize().into()
}
