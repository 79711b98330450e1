use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::guard::DispatchGuard;
use crate::lib::{
    accounts::types::UserDirectory, activity::types::ActivityStore,
    events::types::{NotificationDispatcher, TeamEvent},
};

pub const DEFAULT_SIGNAL: &str = "activityFinished";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Active,
    Terminal,
}

/// What a monitor raises once its activity finishes successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSignal {
    Generic(String),
    /// Raised for the current team of whoever caused the activity.
    TeamScoped(TeamEvent),
}

impl Default for TargetSignal {
    fn default() -> Self {
        TargetSignal::Generic(DEFAULT_SIGNAL.to_string())
    }
}

/// Whether the dispatch guard is shared by every monitor or kept per activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardScope {
    #[default]
    PerOperation,
    /// One dispatch per process, whatever the activity.
    PerWatcherKind,
}

/// Collaborators every monitor in the process shares.
#[derive(Clone)]
pub struct MonitorContext {
    pub activities: Arc<dyn ActivityStore>,
    pub users: Arc<dyn UserDirectory>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub guard: Arc<DispatchGuard>,
}
