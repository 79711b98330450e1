use std::{path::Path, time::Duration};

use anyhow::Context;
use tracing::info;

use super::types::{Config, ENV_PREFIX, Inventory};

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn ssh_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_connect_timeout_secs)
    }

    pub async fn load_inventory(&self) -> anyhow::Result<Inventory> {
        match &self.inventory {
            Some(path) => Inventory::load(path).await,
            None => Ok(Inventory::default()),
        }
    }
}

impl Inventory {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading inventory {}", path.display()))?;
        let inventory: Inventory = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing inventory {}", path.display()))?;
        info!(
            users = inventory.users.len(),
            services = inventory.services.len(),
            "Loaded inventory"
        );
        Ok(inventory)
    }
}
