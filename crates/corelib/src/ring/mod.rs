//! The Chord overlay: node identifiers, finger tables, successor/
//! predecessor discovery, and join/stabilization.

pub mod node;
pub mod transport;

pub use node::RingNode;
pub use transport::{RingTransport, TransportError};
