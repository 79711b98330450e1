use tracing::{debug, info, warn};

use super::types::{MonitorContext, MonitorState, TargetSignal};
use crate::lib::{
    activity::types::{ActivityRecord, OperationId},
    events::types::Notification,
};

/// Watches one activity until it records an exit code, then raises its
/// target signal at most once. Driven by explicit ticks.
pub struct ActivityMonitor {
    context: MonitorContext,
    activity_id: Option<OperationId>,
    target: Option<TargetSignal>,
    activity: Option<ActivityRecord>,
    state: MonitorState,
}

impl ActivityMonitor {
    pub fn new(context: MonitorContext) -> Self {
        ActivityMonitor {
            context,
            activity_id: None,
            target: None,
            activity: None,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_polling_active(&self) -> bool {
        self.state == MonitorState::Active
    }

    pub fn activity_id(&self) -> Option<OperationId> {
        self.activity_id
    }

    pub fn activity(&self) -> Option<&ActivityRecord> {
        self.activity.as_ref()
    }

    /// Binds the monitor to `activity_id` and loads it once. A `None` target
    /// watches without dispatching anything.
    pub async fn start(&mut self, activity_id: OperationId, target: Option<TargetSignal>) {
        self.activity_id = Some(activity_id);
        self.target = target;
        self.activity = None;
        self.refresh().await;
        self.state = MonitorState::Active;
        debug!(activity = %activity_id, "Monitor started");
    }

    pub async fn tick(&mut self) -> MonitorState {
        if self.state == MonitorState::Active {
            self.refresh().await;
            self.evaluate().await;
        }
        self.state
    }

    /// Stops polling. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state == MonitorState::Active {
            self.state = MonitorState::Idle;
            self.activity_id = None;
            self.activity = None;
        }
    }

    async fn refresh(&mut self) {
        let Some(id) = self.activity_id else {
            return;
        };
        match self.context.activities.find(id).await {
            Ok(activity) => self.activity = activity,
            Err(err) => warn!(activity = %id, error = %err, "Could not refresh activity"),
        }
    }

    async fn evaluate(&mut self) {
        let Some(activity) = &self.activity else {
            return;
        };
        let Some(exit_code) = activity.exit_code() else {
            return;
        };
        let (id, causer_id, status) = (activity.id, activity.causer_id, activity.status());

        self.state = MonitorState::Terminal;
        if exit_code != 0 {
            debug!(activity = %id, exit_code, ?status, "Activity failed, nothing to dispatch");
            return;
        }

        let notification = match self.target.clone() {
            None => return,
            Some(TargetSignal::Generic(name)) => Notification::Generic { name },
            Some(TargetSignal::TeamScoped(kind)) => {
                let Some(causer_id) = causer_id else {
                    debug!(activity = %id, "Activity has no causer, skipping dispatch");
                    return;
                };
                let user = self.context.users.find(causer_id).await;
                let Some(team) = user.as_ref().and_then(|user| user.current_team()) else {
                    debug!(activity = %id, causer_id, "Causer has no team, skipping dispatch");
                    return;
                };
                Notification::Team {
                    kind,
                    team_id: team.id,
                }
            }
        };

        if self.context.guard.claim(id) {
            info!(activity = %id, %notification, "Activity finished");
            self.context.dispatcher.dispatch(notification);
        } else {
            debug!(activity = %id, "Completion already dispatched");
        }
    }
}
