use futures_util::future::join_all;
use tracing::{debug, info};

use super::types::{ContainerStatus, Server, Service, TeamId};
use crate::lib::{activity::recorder::OperationRecorder, remote::types::ExecutionError};

/// Network every service is attached to so the reverse proxy can reach it.
pub const PROXY_NETWORK: &str = "harbor-proxy";

const STOP_GRACE_SECS: u64 = 30;

impl Service {
    pub fn server(&self) -> Option<&Server> {
        self.destination.as_ref()?.server.as_ref()
    }

    pub fn team_id(&self) -> TeamId {
        self.environment.project.team.id
    }

    pub fn containers_to_stop(&self) -> Vec<String> {
        self.containers
            .iter()
            .filter(|container| !container.keep_alive)
            .filter(|container| container.status != ContainerStatus::Exited)
            .map(|container| format!("{}-{}", container.name, self.uuid))
            .collect()
    }

    /// Networks owned by the service. Without explicit ones the service
    /// lives on a network named after its uuid.
    pub fn connected_networks(&self) -> Vec<String> {
        if self.networks.is_empty() {
            return vec![self.uuid.clone()];
        }
        self.networks.iter().map(|network| network.name.clone()).collect()
    }

    pub async fn stop_containers(
        &self,
        containers: &[String],
        server: &Server,
        recorder: &OperationRecorder,
    ) -> Result<(), ExecutionError> {
        info!(service = %self.uuid, count = containers.len(), "Stopping service containers");

        let stops = containers.iter().map(|name| async move {
            recorder
                .instant(server, &format!("docker stop --time={STOP_GRACE_SECS} {name}"))
                .await?;
            recorder.instant(server, &format!("docker rm -f {name}")).await?;
            Ok::<(), ExecutionError>(())
        });

        join_all(stops).await.into_iter().collect()
    }

    pub async fn delete_connected_networks(
        &self,
        server: &Server,
        recorder: &OperationRecorder,
    ) -> Result<(), ExecutionError> {
        for network in self.connected_networks() {
            let disconnect = format!("docker network disconnect {network} {PROXY_NETWORK}");
            match recorder.instant(server, &disconnect).await {
                Ok(_) => {}
                // Not attached to the proxy.
                Err(ExecutionError::CommandFailed { exit_code, .. }) => {
                    debug!(%network, exit_code, "Proxy was not connected to network");
                }
                Err(err) => return Err(err),
            }

            recorder
                .instant(server, &format!("docker network rm {network}"))
                .await?;
            info!(service = %self.uuid, %network, "Deleted network");
        }
        Ok(())
    }
}
