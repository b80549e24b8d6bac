//! Top-level CLI configuration: the node launch surface spec §6 leaves
//! external to the core (`--addr`, ring sizing, bootstrap, store root,
//! capability key) plus the one-shot `put`/`get`/`delete` subcommands
//! used for manual testing and the end-to-end scenarios of spec §8.

use clap::Parser;

use crate::commands::{self, Command};

#[derive(Parser, Debug)]
#[command(
    name = "storage-node",
    version,
    about = "Peer-to-peer erasure-coded storage node"
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Initializes logging and drives the selected subcommand to
    /// completion on a fresh multi-threaded runtime.
    pub fn run(self) -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(commands::run(self.command))
    }
}
