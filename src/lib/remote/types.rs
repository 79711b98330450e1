use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lib::resources::types::Server;

/// Exit code recorded for commands that never produced one of their own.
pub const TIMEOUT_EXIT_CODE: i32 = 124;
pub const CONNECTION_EXIT_CODE: i32 = 255;
pub const INTERNAL_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub output: String,
}

impl CommandOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Could not connect to server {server}: {reason}")]
    Connection { server: String, reason: String },
    #[error("Command timed out after {timeout_secs}s on server {server}")]
    Timeout { server: String, timeout_secs: u64 },
    #[error("Command failed with exit code {exit_code}: {output}")]
    CommandFailed { exit_code: i32, output: String },
    #[error("Failed to spawn remote command: {0}")]
    Spawn(#[from] io::Error),
}

impl ExecutionError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionError::CommandFailed { exit_code, .. } => *exit_code,
            ExecutionError::Timeout { .. } => TIMEOUT_EXIT_CODE,
            ExecutionError::Connection { .. } => CONNECTION_EXIT_CODE,
            ExecutionError::Spawn(_) => INTERNAL_EXIT_CODE,
        }
    }
}

/// Runs shell-level commands against a server.
///
/// Implementations bound every call with their own timeout and report it as
/// [`ExecutionError::Timeout`].
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn run(&self, server: &Server, command: &str) -> Result<CommandOutput, ExecutionError>;
}
