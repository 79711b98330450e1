use std::path::PathBuf;

use serde::Deserialize;

use crate::lib::{accounts::types::User, monitor::types::GuardScope, resources::types::Service};

pub const ENV_PREFIX: &str = "HARBOR_";

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_command_timeout_secs() -> u64 {
    3600
}

fn default_ssh_connect_timeout_secs() -> u64 {
    10
}

/// Runtime settings, read from `HARBOR_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    #[serde(default = "default_ssh_connect_timeout_secs")]
    pub ssh_connect_timeout_secs: u64,
    #[serde(default)]
    pub ssh_identity: Option<PathBuf>,
    #[serde(default)]
    pub guard_scope: GuardScope,
    /// JSON file with the users and services to serve.
    #[serde(default)]
    pub inventory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub services: Vec<Service>,
}
