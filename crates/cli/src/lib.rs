//! CLI for the erasure-coded Chord storage network: launches a node
//! (`serve`) or drives one-shot file operations (`put`/`get`/`delete`)
//! against an already-running ring.

pub mod commands;
pub mod config;

pub use commands::Command;
pub use config::CliConfig;
