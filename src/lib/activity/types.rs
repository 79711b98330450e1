use std::{fmt, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::lib::accounts::types::UserId;

pub const EXIT_CODE: &str = "exitCode";
pub const STATUS: &str = "status";
pub const COMMAND: &str = "command";
pub const OUTPUT: &str = "output";
pub const SERVER: &str = "server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        OperationId(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(OperationId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Queued,
    InProgress,
    Finished,
    Error,
}

impl ActivityStatus {
    pub fn to_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Durable trace of a long-running operation. Terminal once `exitCode`
/// appears in its properties; immutable from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: OperationId,
    pub causer_id: Option<UserId>,
    pub description: String,
    pub properties: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn exit_code(&self) -> Option<i64> {
        self.properties.get(EXIT_CODE).and_then(Value::as_i64)
    }

    pub fn status(&self) -> Option<ActivityStatus> {
        self.properties
            .get(STATUS)
            .and_then(|status| serde_json::from_value(status.clone()).ok())
    }

    pub fn is_terminal(&self) -> bool {
        self.exit_code().is_some()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Activity {0} not found")]
    NotFound(OperationId),
    #[error("Activity {0} already finished")]
    Sealed(OperationId),
    #[cfg(test)]
    #[error("Activity store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn find(&self, id: OperationId) -> Result<Option<ActivityRecord>, StoreError>;

    async fn create(
        &self,
        causer_id: Option<UserId>,
        description: &str,
        properties: Map<String, Value>,
    ) -> Result<OperationId, StoreError>;

    /// Merges `properties` into the record's existing ones.
    async fn update_properties(
        &self,
        id: OperationId,
        properties: Map<String, Value>,
    ) -> Result<(), StoreError>;
}
