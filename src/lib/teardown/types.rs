use async_trait::async_trait;
use thiserror::Error;

use crate::lib::{
    accounts::types::UserId, activity::types::OperationId, remote::types::ExecutionError,
    resources::types::Server,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownOptions {
    pub is_delete_operation: bool,
    pub docker_cleanup: bool,
    /// User that recorded operations are attributed to.
    pub actor: Option<UserId>,
}

impl Default for TeardownOptions {
    fn default() -> Self {
        TeardownOptions {
            is_delete_operation: false,
            docker_cleanup: true,
            actor: None,
        }
    }
}

/// What a successful teardown left running in the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub cleanup_activity: Option<OperationId>,
}

/// Every teardown failure; its `Display` is the message shown to the caller.
#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("Service is not attached to a server")]
    MissingServer,
    #[error("Server is not functional")]
    ServerNotFunctional,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Queue for host-wide docker resource cleanup.
///
/// The cleanup itself runs in the background; `enqueue` only waits for the
/// activity to be recorded and returns its id, or `None` when it could not be.
#[async_trait]
pub trait CleanupQueue: Send + Sync {
    async fn enqueue(
        &self,
        server: &Server,
        aggressive: bool,
        actor: Option<UserId>,
    ) -> Option<OperationId>;
}
