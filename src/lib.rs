//! dungeonbot - tabletop game assistant server
//!
//! Dice rolling and initiative tracking behind an HTTP/JSON API.

pub mod api;
pub mod dice;
pub mod initiative;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
use dice::SavedRollRegistry;
use initiative::InitiativeTracker;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "DUNGEONBOT_";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Host advertised in /swagger.json (defaults to the bind address)
    pub public_host: Option<String>,
    /// Fixed seed for the dice RNG; None seeds from the OS
    pub rng_seed: Option<u64>,
    /// Allow cross-origin requests from any origin
    pub cors_permissive: bool,
    /// Saved rolls loaded at startup: name -> expression
    pub saved_rolls: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            public_host: None,
            rng_seed: None,
            cors_permissive: false,
            saved_rolls: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the TOML file (if any), then
    /// `DUNGEONBOT_*` environment variables
    ///
    /// A file that is named explicitly must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            anyhow::ensure!(path.is_file(), "Config file not found: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("Failed to load configuration")
    }
}

/// The dungeonbot server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Result<Self> {
        let saved_rolls = SavedRollRegistry::shared();
        for (name, expression) in &config.saved_rolls {
            saved_rolls
                .save(name, expression)
                .with_context(|| format!("Invalid saved roll '{}' in config", name))?;
        }
        if !saved_rolls.is_empty() {
            info!("Loaded {} saved rolls", saved_rolls.len());
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let docs_host = config
            .public_host
            .clone()
            .unwrap_or_else(|| config.bind_addr.to_string());

        let state = AppState {
            initiative: InitiativeTracker::shared(),
            saved_rolls,
            rng: Arc::new(Mutex::new(rng)),
            docs_host: docs_host.into(),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the shared application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.state.clone(), self.config.cors_permissive)
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("dungeonbot listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("dungeonbot shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
