//! dungeonbot - tabletop game assistant server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dungeonbot::{Config, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DungeonBot dice and initiative server
#[derive(Parser, Debug)]
#[command(name = "dungeonbot", version, about = "Dice rolling and initiative tracking server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the configuration)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Seed for the dice RNG (overrides the configuration)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dungeonbot=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
