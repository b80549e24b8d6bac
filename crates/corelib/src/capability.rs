//! Capability tokens: MAC-signed `{name, size, action}` triples that gate
//! every `Write`/`Read`/`Delete` call a `PeerService` accepts.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, ErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// The action a capability authorizes, matching spec wire tag values
/// `READ=1, WRITE=2, DELETE=3`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Read = 1,
    Write = 2,
    Delete = 3,
}

/// A signed token authorizing one action on one named shard/file of a
/// declared size.
///
/// `not_after` is `None` by default (tokens accepted for their full
/// lifetime, matching the distilled source); an issuer that wants expiry
/// sets it explicitly at mint time.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub size: i64,
    pub action: Action,
    pub not_after: Option<i64>,
    mac: [u8; 32],
}

/// Why a capability failed to verify. The verifier is the sole authority
/// on admission: any of these is denied, never retried.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VerifyError {
    InvalidSignature,
    WrongName,
    WrongSize,
    WrongAction,
    Expired,
}

impl From<VerifyError> for Error {
    fn from(e: VerifyError) -> Self {
        Error::new(ErrorKind::PermissionDenied, format!("{:?}", e))
    }
}

fn canonical_encoding(name: &str, size: i64, action: Action, not_after: Option<i64>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(name.len() + 32);
    buf.extend_from_slice(&(name.len() as u64).to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&size.to_be_bytes());
    buf.push(action as u8);
    match not_after {
        Some(t) => {
            buf.push(1);
            buf.extend_from_slice(&t.to_be_bytes());
        }
        None => buf.push(0),
    }
    buf
}

fn sign(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

impl Capability {
    /// Mints a token good for its full lifetime (no expiry).
    pub fn mint(name: impl Into<String>, size: i64, action: Action, key: &[u8]) -> Capability {
        Self::mint_with_expiry(name, size, action, key, None)
    }

    /// Mints a token that `verify` will reject once `now > not_after`.
    pub fn mint_with_expiry(
        name: impl Into<String>,
        size: i64,
        action: Action,
        key: &[u8],
        not_after: Option<i64>,
    ) -> Capability {
        let name = name.into();
        let mac = sign(key, &canonical_encoding(&name, size, action, not_after));
        Capability {
            name,
            size,
            action,
            not_after,
            mac,
        }
    }

    /// Re-scopes a capability to a different name and size (same action,
    /// same key), for presenting an `ErasureClient`'s file-level
    /// capability to a per-shard RPC. `key` must be the same secret that
    /// minted the original — this mints a fresh token, it does not
    /// reinterpret the old MAC under the new fields.
    pub fn rescoped(&self, name: impl Into<String>, size: i64, key: &[u8]) -> Capability {
        Capability::mint_with_expiry(name, size, self.action, key, self.not_after)
    }

    /// Verifies the token's signature, expiry (if any), and that it
    /// matches the requested operation.
    pub fn verify(
        &self,
        key: &[u8],
        expected_name: &str,
        expected_size: i64,
        expected_action: Action,
        now: Option<i64>,
    ) -> Result<(), VerifyError> {
        let expected_mac = sign(
            key,
            &canonical_encoding(&self.name, self.size, self.action, self.not_after),
        );
        // Constant-time compare of the MAC itself; field mismatches below
        // are not secret-dependent so ordinary comparison is fine there.
        if !bool::from(subtle_eq(&expected_mac, &self.mac)) {
            return Err(VerifyError::InvalidSignature);
        }
        if self.name != expected_name {
            return Err(VerifyError::WrongName);
        }
        if self.size != expected_size {
            return Err(VerifyError::WrongSize);
        }
        if self.action != expected_action {
            return Err(VerifyError::WrongAction);
        }
        if let (Some(not_after), Some(now)) = (self.not_after, now) {
            if now > not_after {
                return Err(VerifyError::Expired);
            }
        }
        Ok(())
    }
}

/// Constant-time byte equality without pulling in the `subtle` crate for
/// one comparison.
fn subtle_eq(a: &[u8; 32], b: &[u8; 32]) -> std::primitive::bool {
    let mut diff = 0u8;
    for i in 0..32 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}
