use tokio::sync::broadcast;

use crate::models::Notification;

/// In-process fan-out of admin notifications.
///
/// Delivery is best effort: nothing is buffered for clients that are not
/// subscribed when an event is published, and subscribers that fall more than
/// the channel capacity behind skip the events they missed.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers the event was handed to.
    pub fn publish(&self, notification: Notification) -> usize {
        match self.sender.send(notification) {
            Ok(receivers) => {
                tracing::debug!("Notification delivered to {} subscriber(s)", receivers);
                receivers
            }
            Err(_) => {
                tracing::debug!("No subscribers connected, notification dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
