use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{Notification, NotificationDispatcher};

const CAPACITY: usize = 256;

/// Broadcasts notifications to every subscriber in the process.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationDispatcher for EventBus {
    fn dispatch(&self, notification: Notification) {
        debug!(%notification, "Dispatching notification");
        // No subscribers is fine.
        let _ = self.sender.send(notification);
    }
}

/// Logs every notification until the bus closes.
pub async fn log_notifications(mut receiver: broadcast::Receiver<Notification>) {
    loop {
        match receiver.recv().await {
            Ok(notification) => info!(%notification, "Notification"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification logger lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_dispatched_notifications() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.dispatch(Notification::ServiceStatusChanged { team_id: 4 });

        assert_eq!(
            receiver.recv().await.unwrap(),
            Notification::ServiceStatusChanged { team_id: 4 }
        );
    }

    #[test]
    fn dispatch_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.dispatch(Notification::Generic {
            name: "activityFinished".to_string(),
        });
    }
}
