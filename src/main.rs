use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::lib::{
    accounts::directory::MemoryUserDirectory,
    activity::{recorder::OperationRecorder, store::MemoryActivityStore},
    api::types::HarborServer,
    config::types::Config,
    events::bus::{EventBus, log_notifications},
    monitor::{guard::DispatchGuard, types::MonitorContext},
    remote::ssh::SshExecutor,
    resources::registry::ServiceRegistry,
    teardown::{cleanup::DockerCleanup, stop_service::StopService},
};

mod lib {
    pub mod accounts;
    pub mod activity;
    pub mod api;
    pub mod config;
    pub mod events;
    pub mod monitor;
    pub mod remote;
    pub mod resources;
    pub mod teardown;
    #[cfg(test)]
    pub mod testing;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("reading HARBOR_* configuration")?;
    let inventory = config.load_inventory().await?;

    let bus = EventBus::new();
    tokio::spawn(log_notifications(bus.subscribe()));
    let dispatcher = Arc::new(bus);

    let activities = Arc::new(MemoryActivityStore::new());
    let executor = Arc::new(SshExecutor::new(
        config.ssh_identity.clone(),
        config.ssh_connect_timeout(),
        config.command_timeout(),
    ));
    let recorder = OperationRecorder::new(executor, activities.clone());

    let services = Arc::new(ServiceRegistry::new(inventory.services));
    let stop_service = StopService::new(
        recorder.clone(),
        dispatcher.clone(),
        Arc::new(DockerCleanup::new(recorder)),
    );
    let monitors = MonitorContext {
        activities,
        users: Arc::new(MemoryUserDirectory::new(inventory.users)),
        dispatcher,
        guard: Arc::new(DispatchGuard::new(config.guard_scope)),
    };

    info!(
        services = services.len().await,
        guard_scope = ?config.guard_scope,
        "Starting harbor"
    );

    let server = HarborServer {
        services,
        stop_service,
        monitors,
        poll_interval: config.poll_interval(),
        sessions: Mutex::new(HashMap::new()),
        address: config.listen_addr.clone(),
    };
    server.start_server().await?;

    Ok(())
}
