use std::{future::Future, sync::Arc};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::types::{
    ActivityStatus, ActivityStore, COMMAND, EXIT_CODE, OUTPUT, OperationId, SERVER, STATUS,
    StoreError,
};
use crate::lib::{
    accounts::types::UserId,
    remote::types::{CommandOutput, ExecutionError, RemoteExecutor},
    resources::types::Server,
};

/// Front door for everything executed against a server. Long-running work is
/// recorded as an activity whose `exitCode` is written once the work ends,
/// possibly long after the caller got its [`OperationId`] back.
#[derive(Clone)]
pub struct OperationRecorder {
    executor: Arc<dyn RemoteExecutor>,
    store: Arc<dyn ActivityStore>,
    actor: Option<UserId>,
}

impl OperationRecorder {
    pub fn new(executor: Arc<dyn RemoteExecutor>, store: Arc<dyn ActivityStore>) -> Self {
        OperationRecorder {
            executor,
            store,
            actor: None,
        }
    }

    pub fn as_actor(&self, user_id: UserId) -> Self {
        OperationRecorder {
            actor: Some(user_id),
            ..self.clone()
        }
    }

    /// Records `commands` as one activity. They run in order in a single
    /// remote shell and stop at the first failure.
    pub async fn record(&self, server: &Server, commands: &[&str]) -> Result<OperationId, StoreError> {
        let executor = self.executor.clone();
        let target = server.clone();
        let script = commands.join(" && ");
        let work_script = script.clone();
        self.track(server, &script, async move { executor.run(&target, &work_script).await })
            .await
    }

    pub async fn track<F>(
        &self,
        server: &Server,
        description: &str,
        work: F,
    ) -> Result<OperationId, StoreError>
    where
        F: Future<Output = Result<CommandOutput, ExecutionError>> + Send + 'static,
    {
        let mut properties = Map::new();
        properties.insert(STATUS.to_string(), ActivityStatus::Queued.to_value());
        properties.insert(COMMAND.to_string(), Value::from(description));
        properties.insert(SERVER.to_string(), Value::from(server.uuid.as_str()));

        let id = self.store.create(self.actor, description, properties).await?;
        info!(activity = %id, server = %server.name, description, "Recorded operation");

        let store = self.store.clone();
        tokio::spawn(async move {
            let mut started = Map::new();
            started.insert(STATUS.to_string(), ActivityStatus::InProgress.to_value());
            if let Err(err) = store.update_properties(id, started).await {
                warn!(activity = %id, error = %err, "Could not mark activity in progress");
            }

            let finished = finished_properties(work.await);
            let exit_code = finished.get(EXIT_CODE).cloned();
            match store.update_properties(id, finished).await {
                Ok(()) => info!(activity = %id, exit_code = ?exit_code, "Operation finished"),
                Err(err) => error!(activity = %id, error = %err, "Could not record operation result"),
            }
        });

        Ok(id)
    }

    /// Runs a command in-line without recording an activity. A nonzero exit
    /// is turned into [`ExecutionError::CommandFailed`].
    pub async fn instant(&self, server: &Server, command: &str) -> Result<String, ExecutionError> {
        debug!(server = %server.name, command, "Running instant command");
        let result = self.executor.run(server, command).await?;
        if !result.is_success() {
            warn!(server = %server.name, command, exit_code = result.exit_code, "Command failed");
            return Err(ExecutionError::CommandFailed {
                exit_code: result.exit_code,
                output: result.output,
            });
        }
        Ok(result.output)
    }
}

fn finished_properties(result: Result<CommandOutput, ExecutionError>) -> Map<String, Value> {
    let (exit_code, output) = match result {
        Ok(output) => (output.exit_code, output.output),
        Err(err) => (err.exit_code(), err.to_string()),
    };
    let status = if exit_code == 0 {
        ActivityStatus::Finished
    } else {
        ActivityStatus::Error
    };

    let mut properties = Map::new();
    properties.insert(STATUS.to_string(), status.to_value());
    properties.insert(OUTPUT.to_string(), Value::from(output));
    properties.insert(EXIT_CODE.to_string(), Value::from(exit_code));
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::{
        activity::{store::MemoryActivityStore, types::ActivityRecord},
        remote::types::CONNECTION_EXIT_CODE,
        testing::{Failure, RecordingExecutor, sample_server},
    };

    async fn wait_for_exit(store: &MemoryActivityStore, id: OperationId) -> ActivityRecord {
        for _ in 0..200 {
            if let Some(record) = store.find(id).await.unwrap() {
                if record.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("activity {id} never finished");
    }

    #[tokio::test]
    async fn record_writes_exit_code_when_command_finishes() {
        let executor = RecordingExecutor::new();
        let store = Arc::new(MemoryActivityStore::new());
        let recorder = OperationRecorder::new(executor.clone(), store.clone()).as_actor(3);

        let id = recorder.record(&sample_server(), &["docker ps"]).await.unwrap();
        let record = wait_for_exit(&store, id).await;

        assert_eq!(record.causer_id, Some(3));
        assert_eq!(record.exit_code(), Some(0));
        assert_eq!(record.status(), Some(ActivityStatus::Finished));
        assert_eq!(record.properties[COMMAND], Value::from("docker ps"));
        assert_eq!(executor.commands(), vec!["docker ps".to_string()]);
    }

    #[tokio::test]
    async fn record_captures_nonzero_exit() {
        let executor = RecordingExecutor::new();
        executor.fail_on("docker", Failure::Exit(7));
        let store = Arc::new(MemoryActivityStore::new());
        let recorder = OperationRecorder::new(executor, store.clone());

        let id = recorder.record(&sample_server(), &["docker pull x"]).await.unwrap();
        let record = wait_for_exit(&store, id).await;

        assert_eq!(record.causer_id, None);
        assert_eq!(record.exit_code(), Some(7));
        assert_eq!(record.status(), Some(ActivityStatus::Error));
    }

    #[tokio::test]
    async fn record_chains_commands_into_one_activity() {
        let executor = RecordingExecutor::new();
        let store = Arc::new(MemoryActivityStore::new());
        let recorder = OperationRecorder::new(executor.clone(), store.clone());

        let id = recorder
            .record(&sample_server(), &["docker container prune -f", "docker image prune -f"])
            .await
            .unwrap();
        let record = wait_for_exit(&store, id).await;

        let script = "docker container prune -f && docker image prune -f";
        assert_eq!(record.description, script);
        assert_eq!(record.properties[SERVER], Value::from("srv-1"));
        assert_eq!(executor.commands(), vec![script.to_string()]);
    }

    #[tokio::test]
    async fn tracked_failure_gets_a_nonzero_exit_code() {
        let store = Arc::new(MemoryActivityStore::new());
        let recorder = OperationRecorder::new(RecordingExecutor::new(), store.clone());

        let id = recorder
            .track(&sample_server(), "docker cleanup", async {
                Err(ExecutionError::Connection {
                    server: "edge-1".to_string(),
                    reason: "no route to host".to_string(),
                })
            })
            .await
            .unwrap();
        let record = wait_for_exit(&store, id).await;

        assert_eq!(record.exit_code(), Some(i64::from(CONNECTION_EXIT_CODE)));
        assert!(record.properties[OUTPUT].as_str().unwrap().contains("no route to host"));
    }

    #[tokio::test]
    async fn instant_fails_on_nonzero_exit() {
        let executor = RecordingExecutor::new();
        executor.fail_on("docker rm", Failure::Exit(1));
        let recorder = OperationRecorder::new(executor, Arc::new(MemoryActivityStore::new()));
        let server = sample_server();

        assert!(recorder.instant(&server, "docker ps").await.is_ok());
        let err = recorder.instant(&server, "docker rm -f x").await.unwrap_err();
        assert!(matches!(err, ExecutionError::CommandFailed { exit_code: 1, .. }));
    }
}
