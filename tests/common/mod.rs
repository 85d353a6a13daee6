//! Common test utilities - DungeonTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dungeonbot::{Config, Server};
use reqwest::Client;
use tokio::task::JoinHandle;

/// Test harness that spawns a real dungeonbot server on a random port
pub struct DungeonTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl DungeonTest {
    /// Start a new test server instance with a fixed RNG seed
    pub async fn start() -> Result<Self> {
        Self::start_with(Config {
            rng_seed: Some(42),
            ..Config::default()
        })
        .await
    }

    /// Start a test server from the given config, replacing its bind address
    pub async fn start_with(mut config: Config) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        config.bind_addr = addr;
        let server = Arc::new(Server::new(config)?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Add an initiative entity, asserting success
    pub async fn add_entity(&self, name: &str, value: i64) -> Result<serde_json::Value> {
        let resp = self
            .post(
                "/init",
                &serde_json::json!({ "entityName": name, "initiativeValue": value }),
            )
            .await?;
        anyhow::ensure!(resp.status() == 202, "add {} failed: {}", name, resp.status());
        Ok(resp.json().await?)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for DungeonTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
