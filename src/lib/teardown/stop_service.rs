use std::sync::Arc;

use tracing::{info, warn};

use super::types::{CleanupQueue, TeardownError, TeardownOptions, TeardownReport};
use crate::lib::{
    activity::recorder::OperationRecorder,
    events::types::{Notification, NotificationDispatcher},
    resources::types::{Service, TeamId},
};

/// Stops a service's containers and, for deletes, removes its networks and
/// schedules a docker cleanup on its server.
#[derive(Clone)]
pub struct StopService {
    recorder: OperationRecorder,
    dispatcher: Arc<dyn NotificationDispatcher>,
    cleanup: Arc<dyn CleanupQueue>,
}

/// Dispatches the status-changed notification when dropped, so it fires on
/// every exit path of a teardown.
struct StatusChangedOnExit {
    dispatcher: Arc<dyn NotificationDispatcher>,
    team_id: TeamId,
}

impl Drop for StatusChangedOnExit {
    fn drop(&mut self) {
        self.dispatcher.dispatch(Notification::ServiceStatusChanged {
            team_id: self.team_id,
        });
    }
}

impl StopService {
    pub fn new(
        recorder: OperationRecorder,
        dispatcher: Arc<dyn NotificationDispatcher>,
        cleanup: Arc<dyn CleanupQueue>,
    ) -> Self {
        StopService {
            recorder,
            dispatcher,
            cleanup,
        }
    }

    pub async fn handle(
        &self,
        service: &Service,
        options: TeardownOptions,
    ) -> Result<TeardownReport, TeardownError> {
        let _status_changed = StatusChangedOnExit {
            dispatcher: self.dispatcher.clone(),
            team_id: service.team_id(),
        };

        let result = self.teardown(service, options).await;
        match &result {
            Ok(report) => info!(
                service = %service.uuid,
                ?options,
                cleanup_activity = ?report.cleanup_activity,
                "Service stopped"
            ),
            Err(err) => warn!(service = %service.uuid, ?options, error = %err, "Service teardown failed"),
        }
        result
    }

    async fn teardown(
        &self,
        service: &Service,
        options: TeardownOptions,
    ) -> Result<TeardownReport, TeardownError> {
        let server = service.server().ok_or(TeardownError::MissingServer)?;
        if !server.is_functional() {
            return Err(TeardownError::ServerNotFunctional);
        }

        let containers = service.containers_to_stop();
        service
            .stop_containers(&containers, server, &self.recorder)
            .await?;

        let mut report = TeardownReport::default();
        if options.is_delete_operation {
            service
                .delete_connected_networks(server, &self.recorder)
                .await?;
            if options.docker_cleanup {
                report.cleanup_activity = self.cleanup.enqueue(server, true, options.actor).await;
            }
        }

        Ok(report)
    }
}
