//! A cached pointer to a node at some distance in the identifier space.

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};

/// `(id, address)`. `address` is an opaque locator the transport knows
/// how to dial — the ring never interprets it.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Finger {
    pub id: Identifier,
    pub address: String,
}

impl Finger {
    pub fn new(id: Identifier, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
        }
    }
}
