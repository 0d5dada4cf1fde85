/// Membership-proof capability
///
/// Referral whitelisting in the Merkle airdrop variant is delegated to an
/// opaque oracle: the engine only asks "is this leaf under this root". The
/// shipped [`KeccakProver`] implements the common sorted-pair keccak256
/// scheme so campaigns interoperate with standard airdrop tooling, but any
/// other prover can be plugged in through the trait.
use alloy_primitives::{keccak256, Address, B256};

use crate::error::Error;

pub trait MembershipProver {
    fn verify(&self, proof: &[B256], root: B256, leaf: B256) -> bool;
}

/// Sorted-pair keccak256 Merkle verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakProver;

impl MembershipProver for KeccakProver {
    fn verify(&self, proof: &[B256], root: B256, leaf: B256) -> bool {
        let mut node = leaf;
        for sibling in proof {
            node = hash_pair(node, *sibling);
        }
        node == root
    }
}

/// Leaf digest for a whitelisted address.
pub fn leaf_for_address(address: Address) -> B256 {
    keccak256(address.as_slice())
}

/// Parse a 32-byte root from a hex string, with or without a `0x` prefix.
pub fn root_from_hex(s: &str) -> Result<B256, Error> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)
        .map_err(|e| Error::InvalidInput(format!("malformed root hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(Error::InvalidInput(format!(
            "root must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

/// Sorted-pair node digest: the smaller operand hashes first, so proofs do
/// not need to carry left/right positions.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}
