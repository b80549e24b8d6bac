//! Deterministic placement hash.

use crate::identifier::Identifier;

/// Hashes `bytes` into `[0, m)`.
///
/// Uses the first 8 bytes of a `blake3` digest as a big-endian `u64`,
/// reduced modulo `m`. Any two nodes hashing the same bytes with the same
/// `m` get the same identifier — the only property the ring needs.
pub fn hash(bytes: &[u8], m: u64) -> Identifier {
    if m == 0 {
        return Identifier::ZERO;
    }
    let digest = blake3::hash(bytes);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[..8]);
    let v = u64::from_be_bytes(buf);
    Identifier(v % m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(hash(b"f.txt", 1000), hash(b"f.txt", 1000));
    }

    #[test]
    fn in_range() {
        for key in ["a", "b", "the quick brown fox", "f.txt_rep7"] {
            let id = hash(key.as_bytes(), 1000);
            assert!(id.0 < 1000);
        }
    }

    #[test]
    fn different_keys_usually_differ() {
        assert_ne!(hash(b"f.txt_rep0", 1_000_000), hash(b"f.txt_rep1", 1_000_000));
    }
}
