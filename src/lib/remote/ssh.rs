use std::{path::PathBuf, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{CommandOutput, ExecutionError, RemoteExecutor};
use crate::lib::resources::types::Server;

/// ssh reserves this exit status for its own connection failures.
const SSH_CONNECTION_FAILURE: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshExecutor {
    identity: Option<PathBuf>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(identity: Option<PathBuf>, connect_timeout: Duration, timeout: Duration) -> Self {
        SshExecutor {
            identity,
            connect_timeout,
            timeout,
        }
    }

    fn command(&self, server: &Server, command: &str) -> Command {
        let mut ssh = Command::new("ssh");
        ssh.args(["-o", "BatchMode=yes"])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout.as_secs()))
            .arg("-p")
            .arg(server.port.to_string());
        if let Some(identity) = &self.identity {
            ssh.arg("-i").arg(identity);
        }
        ssh.arg(server.ssh_target()).arg(command);
        ssh
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run(&self, server: &Server, command: &str) -> Result<CommandOutput, ExecutionError> {
        debug!(server = %server.name, command, "Running remote command");

        let child = self
            .command(server, command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(server = %server.name, command, "Remote command timed out");
                return Err(ExecutionError::Timeout {
                    server: server.name.clone(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let text = text.trim_end().to_string();

        // Killed by a signal.
        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code == SSH_CONNECTION_FAILURE {
            return Err(ExecutionError::Connection {
                server: server.name.clone(),
                reason: text,
            });
        }

        Ok(CommandOutput {
            exit_code,
            output: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::testing::sample_server;

    #[test]
    fn builds_ssh_invocation_for_server() {
        let executor = SshExecutor::new(
            Some(PathBuf::from("/keys/id_ed25519")),
            Duration::from_secs(10),
            Duration::from_secs(60),
        );
        let mut server = sample_server();
        server.port = 2222;

        let command = executor.command(&server, "docker ps");
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        assert_eq!(command.as_std().get_program(), "ssh");
        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "StrictHostKeyChecking=accept-new",
                "-o",
                "ConnectTimeout=10",
                "-p",
                "2222",
                "-i",
                "/keys/id_ed25519",
                "root@10.0.0.5",
                "docker ps",
            ]
        );
    }
}
