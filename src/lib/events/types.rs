use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lib::resources::types::TeamId;

/// Event kinds broadcast to every member of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamEvent {
    ServiceStatusChanged,
    ApplicationStatusChanged,
    DatabaseStatusChanged,
    ServerValidated,
    CleanupFinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ServiceStatusChanged { team_id: TeamId },
    Team { kind: TeamEvent, team_id: TeamId },
    Generic { name: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::ServiceStatusChanged { team_id } => {
                write!(f, "service status changed (team {})", team_id)
            }
            Notification::Team { kind, team_id } => write!(f, "{:?} (team {})", kind, team_id),
            Notification::Generic { name } => write!(f, "{}", name),
        }
    }
}

/// Fan-out point for notifications. Dispatch is synchronous so it can run
/// from drop guards.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification);
}
