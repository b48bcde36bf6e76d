//! Deterministic ledger digests

use sha2::{Digest, Sha256};
use types::ledger::LedgerSnapshot;

use crate::interchange::encode_snapshot;
use crate::wire::InterchangeError;

/// SHA-256 over the canonical interchange encoding, as lowercase hex.
///
/// Equal ledgers produce equal digests whatever stream of transactions
/// produced them, so comparing digests across replicas is a convergence
/// check that needs no byte-level state exchange.
pub fn state_digest(snapshot: &LedgerSnapshot) -> Result<String, InterchangeError> {
    let bytes = encode_snapshot(snapshot)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
