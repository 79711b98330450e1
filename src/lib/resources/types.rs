use serde::{Deserialize, Serialize};

pub type TeamId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub team: Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
    pub project: Project,
}

/// Flags kept up to date by server validation. A server is only
/// considered functional when every one of them allows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub is_reachable: bool,
    pub is_usable: bool,
    pub force_disabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            is_reachable: true,
            is_usable: true,
            force_disabled: false,
        }
    }
}

fn default_user() -> String {
    "root".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: u64,
    pub uuid: String,
    pub name: String,
    pub ip: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub settings: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: u64,
    pub network: String,
    pub server: Option<Server>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Restarting,
    Exited,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Application,
    Database,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContainer {
    pub name: String,
    pub kind: ContainerKind,
    pub status: ContainerStatus,
    /// Containers flagged keep-alive survive a stop of their service.
    #[serde(default)]
    pub keep_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    pub uuid: String,
    pub name: String,
    pub environment: Environment,
    pub destination: Option<Destination>,
    #[serde(default)]
    pub containers: Vec<ServiceContainer>,
    #[serde(default)]
    pub networks: Vec<Network>,
}
