use std::time::Duration;

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::debug;

use super::{monitor::ActivityMonitor, types::MonitorState};

/// Handle to a monitor polling in the background. Dropping the handle stops
/// the polling as well.
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<MonitorState>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    #[cfg(test)]
    pub async fn join(self) -> MonitorState {
        let MonitorHandle { stop, task } = self;
        let state = task.await.unwrap_or(MonitorState::Idle);
        drop(stop);
        state
    }
}

/// Ticks a started monitor every `period` until it reaches a terminal state
/// or its handle asks it to stop.
pub fn spawn_polling(mut monitor: ActivityMonitor, period: Duration) -> MonitorHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stopped.changed() => {
                    monitor.stop();
                    break;
                }
                _ = ticker.tick() => {
                    monitor.tick().await;
                    if !monitor.is_polling_active() {
                        break;
                    }
                }
            }
        }

        debug!(activity = ?monitor.activity_id(), state = ?monitor.state(), "Monitor finished polling");
        monitor.state()
    });

    MonitorHandle { stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::{
        events::types::{Notification, TeamEvent},
        monitor::types::{GuardScope, TargetSignal},
        testing::Fixture,
    };

    const PERIOD: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn polls_until_activity_finishes() {
        let fixture = Fixture::new(GuardScope::PerOperation);
        let id = fixture.activity(Some(1)).await;
        let mut monitor = fixture.monitor();
        monitor
            .start(id, Some(TargetSignal::TeamScoped(TeamEvent::CleanupFinished)))
            .await;

        let handle = spawn_polling(monitor, PERIOD);
        tokio::time::sleep(PERIOD * 3).await;
        assert!(!handle.is_finished());

        fixture.finish(id, 0).await;
        assert_eq!(handle.join().await, MonitorState::Terminal);
        assert_eq!(
            fixture.dispatcher.dispatched(),
            vec![Notification::Team {
                kind: TeamEvent::CleanupFinished,
                team_id: 42,
            }]
        );
    }

    #[tokio::test]
    async fn stop_ends_polling_without_dispatch() {
        let fixture = Fixture::new(GuardScope::PerOperation);
        let id = fixture.activity(Some(1)).await;
        let mut monitor = fixture.monitor();
        monitor.start(id, Some(TargetSignal::default())).await;

        let handle = spawn_polling(monitor, PERIOD);
        handle.stop();
        handle.stop();
        assert_eq!(handle.join().await, MonitorState::Idle);

        fixture.finish(id, 0).await;
        assert!(fixture.dispatcher.dispatched().is_empty());
    }
}
