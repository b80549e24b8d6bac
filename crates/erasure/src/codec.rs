//! Reed-Solomon shard splitting and reconstruction over `GF(2^8)`, per
//! spec §3/§4.6: a file of length `N` becomes `D` data shards of length
//! `s = ceil(N/D)` (the last data shard zero-padded) plus `P` parity
//! shards computed over them.

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::error::Error;

/// `s = ceil(n / d)`, at least 1 so a zero-length file still produces
/// well-formed (empty-content) shards.
pub fn shard_len(n: usize, d: usize) -> usize {
    if d == 0 {
        return 0;
    }
    ((n + d - 1) / d).max(1)
}

/// Splits `data` into `d` data shards of `shard_len(data.len(), d)` bytes
/// each (the last zero-padded) and computes `p` parity shards, returning
/// all `d + p` shards in order.
pub fn encode(data: &[u8], d: usize, p: usize) -> Result<Vec<Vec<u8>>, Error> {
    let s = shard_len(data.len(), d);
    let mut shards = vec![vec![0u8; s]; d + p];

    for i in 0..d {
        let start = i * s;
        if start >= data.len() {
            continue;
        }
        let end = (start + s).min(data.len());
        shards[i][..end - start].copy_from_slice(&data[start..end]);
    }

    let rs = ReedSolomon::new(d, p).map_err(|e| Error::Codec(e.to_string()))?;
    rs.encode(&mut shards).map_err(|e| Error::Codec(e.to_string()))?;
    Ok(shards)
}

/// Reconstructs the `d` data shards from whatever subset of `d + p`
/// shards is present (`None` entries are the missing ones) and
/// concatenates them, trimming to `original_len` bytes of padding.
///
/// Callers are responsible for having already checked that at most `p`
/// entries are `None` (see `ensure_recoverable`); this only runs the
/// codec and assembles the result.
pub fn reconstruct(mut shards: Vec<Option<Vec<u8>>>, d: usize, p: usize, original_len: usize) -> Result<Vec<u8>, Error> {
    let rs = ReedSolomon::new(d, p).map_err(|e| Error::Codec(e.to_string()))?;
    rs.reconstruct_data(&mut shards)
        .map_err(|e| Error::Codec(e.to_string()))?;

    let mut out = Vec::with_capacity(original_len);
    for shard in shards.into_iter().take(d) {
        out.extend(shard.expect("reconstruct_data fills every data shard"));
    }
    out.truncate(original_len);
    Ok(out)
}

/// `Err(TooManyCorrupt)` if more than `p` of the `d + p` shards are
/// missing; otherwise `Ok(())`.
pub fn ensure_recoverable(missing: usize, p: usize) -> Result<(), Error> {
    if missing > p {
        Err(Error::TooManyCorrupt { missing, max: p })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_len_matches_spec_example() {
        // 4096 bytes over D=8 data shards -> 512 bytes per shard.
        assert_eq!(shard_len(4096, 8), 512);
        assert_eq!(shard_len(1, 8), 1);
        assert_eq!(shard_len(0, 8), 1);
    }

    #[test]
    fn round_trip_with_no_missing_shards() {
        let data = b"the quick brown fox jumps over the lazy dog, repeated enough to span multiple data shards of a small Reed-Solomon configuration";
        let shards = encode(data, 4, 2).unwrap();
        let opt_shards: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        let rebuilt = reconstruct(opt_shards, 4, 2, data.len()).unwrap();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn round_trip_tolerates_p_missing_shards() {
        let data = b"erasure coding survives the loss of up to P shard hosts without losing any file bytes";
        let shards = encode(data, 4, 2).unwrap();
        let mut opt_shards: Vec<Option<Vec<u8>>> = shards.into_iter().map(Some).collect();
        opt_shards[1] = None;
        opt_shards[4] = None;
        ensure_recoverable(2, 2).unwrap();
        let rebuilt = reconstruct(opt_shards, 4, 2, data.len()).unwrap();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn more_than_p_missing_is_too_many_corrupt() {
        assert!(ensure_recoverable(3, 2).is_err());
        assert!(ensure_recoverable(2, 2).is_ok());
    }
}
