use async_trait::async_trait;
use tracing::{info, warn};

use super::types::CleanupQueue;
use crate::lib::{
    accounts::types::UserId,
    activity::{recorder::OperationRecorder, types::OperationId},
    resources::types::Server,
};

const LIGHT_PRUNE: &[&str] = &["docker container prune -f", "docker image prune -f"];

const AGGRESSIVE_PRUNE: &[&str] = &[
    "docker container prune -f",
    "docker image prune -af",
    "docker network prune -f",
];

/// Stopped containers and dangling images always go. The aggressive prune
/// also drops every unused image and network.
pub fn prune_commands(aggressive: bool) -> &'static [&'static str] {
    if aggressive {
        AGGRESSIVE_PRUNE
    } else {
        LIGHT_PRUNE
    }
}

/// Prunes docker resources on a server over the same SSH channel as every
/// other operation, recorded as an activity callers can watch.
#[derive(Clone)]
pub struct DockerCleanup {
    recorder: OperationRecorder,
}

impl DockerCleanup {
    pub fn new(recorder: OperationRecorder) -> Self {
        DockerCleanup { recorder }
    }
}

#[async_trait]
impl CleanupQueue for DockerCleanup {
    async fn enqueue(
        &self,
        server: &Server,
        aggressive: bool,
        actor: Option<UserId>,
    ) -> Option<OperationId> {
        let recorder = match actor {
            Some(user_id) => self.recorder.as_actor(user_id),
            None => self.recorder.clone(),
        };

        match recorder.record(server, prune_commands(aggressive)).await {
            Ok(id) => {
                info!(activity = %id, server = %server.name, aggressive, "Docker cleanup queued");
                Some(id)
            }
            Err(err) => {
                warn!(server = %server.name, error = %err, "Could not queue docker cleanup");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::lib::{
        activity::{
            store::MemoryActivityStore,
            types::{ActivityRecord, ActivityStatus, ActivityStore},
        },
        remote::types::CONNECTION_EXIT_CODE,
        testing::{FailingActivityStore, Failure, RecordingExecutor, sample_server},
    };

    struct Harness {
        executor: Arc<RecordingExecutor>,
        store: Arc<MemoryActivityStore>,
        cleanup: DockerCleanup,
    }

    fn harness() -> Harness {
        let executor = RecordingExecutor::new();
        let store = Arc::new(MemoryActivityStore::new());
        let cleanup = DockerCleanup::new(OperationRecorder::new(executor.clone(), store.clone()));
        Harness {
            executor,
            store,
            cleanup,
        }
    }

    async fn wait_for_exit(store: &MemoryActivityStore, id: OperationId) -> ActivityRecord {
        for _ in 0..200 {
            if let Some(record) = store.find(id).await.unwrap() {
                if record.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cleanup {id} never finished");
    }

    #[tokio::test]
    async fn aggressive_cleanup_prunes_images_and_networks() {
        let h = harness();

        let id = h.cleanup.enqueue(&sample_server(), true, Some(1)).await.unwrap();
        let record = wait_for_exit(&h.store, id).await;

        assert_eq!(
            h.executor.commands(),
            vec![
                "docker container prune -f && docker image prune -af && docker network prune -f"
                    .to_string()
            ]
        );
        assert_eq!(record.causer_id, Some(1));
        assert_eq!(record.exit_code(), Some(0));
        assert_eq!(record.status(), Some(ActivityStatus::Finished));
    }

    #[tokio::test]
    async fn light_cleanup_keeps_tagged_images_and_networks() {
        let h = harness();

        let id = h.cleanup.enqueue(&sample_server(), false, None).await.unwrap();
        let record = wait_for_exit(&h.store, id).await;

        assert_eq!(
            h.executor.commands(),
            vec!["docker container prune -f && docker image prune -f".to_string()]
        );
        assert_eq!(record.causer_id, None);
    }

    #[tokio::test]
    async fn unreachable_server_records_connection_exit_code() {
        let h = harness();
        h.executor.fail_on("docker", Failure::Unreachable);

        let id = h.cleanup.enqueue(&sample_server(), true, Some(1)).await.unwrap();
        let record = wait_for_exit(&h.store, id).await;

        assert_eq!(record.exit_code(), Some(i64::from(CONNECTION_EXIT_CODE)));
        assert_eq!(record.status(), Some(ActivityStatus::Error));
    }

    #[tokio::test]
    async fn unrecordable_cleanup_returns_no_activity_and_runs_nothing() {
        let executor = RecordingExecutor::new();
        let cleanup = DockerCleanup::new(OperationRecorder::new(
            executor.clone(),
            Arc::new(FailingActivityStore),
        ));

        assert_eq!(cleanup.enqueue(&sample_server(), true, None).await, None);
        tokio::task::yield_now().await;
        assert!(executor.commands().is_empty());
    }
}
