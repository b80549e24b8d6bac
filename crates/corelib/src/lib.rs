//! Core abstractions for the storage network: the identifier space, the
//! placement hash, capability tokens, and the Chord ring (`RingNode`)
//! they're built on.
//!
//! This crate is transport- and runtime-agnostic: `RingNode` talks to the
//! rest of the ring only through the `ring::RingTransport` trait, which
//! `peer`'s QUIC client implements.

pub mod capability;
pub mod error;
pub mod finger;
pub mod hash;
pub mod identifier;
pub mod ring;

pub use capability::{Action, Capability, VerifyError};
pub use error::{Error, ErrorKind, Result};
pub use finger::Finger;
pub use hash::hash;
pub use identifier::Identifier;
pub use ring::{RingNode, RingTransport, TransportError};
