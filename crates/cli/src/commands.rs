//! Subcommands: `serve` starts a node and blocks until interrupted;
//! `put`/`get`/`delete` are one-shot `ErasureClient` calls against an
//! already-running ring, standing in for the distilled source's
//! `SendFile`-in-a-loop `main.go`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use erasure::ErasureClient;
use peer::{PeerNode, QuicShardTransport};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Binds `--addr`, optionally joins the ring through `--bootstrap`,
    /// and serves RPCs until interrupted.
    Serve(ServeArgs),
    /// Splits a file into erasure-coded shards and uploads it to the ring.
    Put(PutArgs),
    /// Downloads a file from the ring, reconstructing from whatever
    /// shards are available.
    Get(GetArgs),
    /// Deletes every shard of a file from the ring.
    Delete(ShardArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// External address this node binds and advertises to the ring.
    #[arg(long)]
    pub addr: SocketAddr,
    /// log2 of the ring modulus `M`; every node in one ring must agree
    /// on this (spec §6: "All nodes in one ring MUST share M").
    #[arg(long, default_value_t = 32)]
    pub ring_bits: u32,
    /// Address of an existing ring member. Omitted for the first node.
    #[arg(long)]
    pub bootstrap: Option<SocketAddr>,
    /// Directory this node's `ShardStore` writes shard files under.
    #[arg(long, default_value = "./store")]
    pub store_root: PathBuf,
    /// Path to the shared capability-signing key, raw bytes.
    #[arg(long)]
    pub capability_key_file: PathBuf,
    /// Milliseconds between Stabilize ticks (spec §5 default: 1000).
    #[arg(long, default_value_t = 1000)]
    pub stab_interval_ms: u64,
}

#[derive(Args, Debug)]
pub struct RingAccess {
    /// Address of any node already in the target ring.
    #[arg(long)]
    pub ring_entry: SocketAddr,
    /// log2 of the ring modulus; must match the ring's own `--ring-bits`.
    #[arg(long, default_value_t = 32)]
    pub ring_bits: u32,
    /// Path to the shared capability-signing key, raw bytes.
    #[arg(long)]
    pub capability_key_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct PutArgs {
    #[command(flatten)]
    pub ring: RingAccess,
    /// File name to store it under.
    pub name: String,
    /// Local file whose bytes are uploaded.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub ring: RingAccess,
    /// File name to fetch.
    pub name: String,
    /// Original file length in bytes — the only carrier of this once
    /// shard padding is stripped (spec §9, "padding length recovery").
    #[arg(long)]
    pub size: usize,
    /// Local path the reconstructed bytes are written to.
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ShardArgs {
    #[command(flatten)]
    pub ring: RingAccess,
    pub name: String,
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve(args) => serve(args).await,
        Command::Put(args) => put(args).await,
        Command::Get(args) => get(args).await,
        Command::Delete(args) => delete(args).await,
    }
}

/// `2^bits`, validated to fit a `u64` ring modulus.
fn ring_modulus(bits: u32) -> anyhow::Result<u64> {
    if bits == 0 || bits > 63 {
        anyhow::bail!("--ring-bits must be between 1 and 63, got {bits}");
    }
    Ok(1u64 << bits)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let m = ring_modulus(args.ring_bits)?;
    let key = std::fs::read(&args.capability_key_file)?;
    let bootstrap = args.bootstrap.map(|a| a.to_string());

    let node = PeerNode::new(args.addr, m, bootstrap.as_deref(), args.store_root, key).await?;
    tracing::info!(addr = %node.addr, id = %node.service.ring().self_finger().id, "node started");

    let node = Arc::new(node);
    let serve_node = node.clone();
    let serve_task = tokio::spawn(async move { peer::serve(&serve_node).await });

    let stab_node = node.clone();
    let stab_interval = Duration::from_millis(args.stab_interval_ms);
    let stabilize_task = tokio::spawn(async move { peer::run_stabilize(&stab_node, stab_interval).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    serve_task.abort();
    stabilize_task.abort();
    node.server_endpoint.close(quinn::VarInt::from_u32(0), b"shutdown");
    Ok(())
}

fn build_client(ring: &RingAccess) -> anyhow::Result<ErasureClient<QuicShardTransport>> {
    let m = ring_modulus(ring.ring_bits)?;
    let key = std::fs::read(&ring.capability_key_file)?;
    let endpoint = streaming::client_endpoint()?;
    let transport = Arc::new(QuicShardTransport::new(endpoint, Duration::from_secs(5)));
    Ok(ErasureClient::with_defaults(ring.ring_entry.to_string(), transport, key, m))
}

async fn put(args: PutArgs) -> anyhow::Result<()> {
    let client = build_client(&args.ring)?;
    let content = std::fs::read(&args.file)?;
    client.upload_file_rsc(&args.name, &content).await?;
    println!("uploaded {} ({} bytes)", args.name, content.len());
    Ok(())
}

async fn get(args: GetArgs) -> anyhow::Result<()> {
    let client = build_client(&args.ring)?;
    let content = client.download_file_rsc(&args.name, args.size).await?;
    std::fs::write(&args.output, &content)?;
    println!("downloaded {} ({} bytes) -> {}", args.name, content.len(), args.output.display());
    Ok(())
}

async fn delete(args: ShardArgs) -> anyhow::Result<()> {
    let client = build_client(&args.ring)?;
    client.delete_file_rsc(&args.name).await?;
    println!("deleted {}", args.name);
    Ok(())
}
