//! Hand-off to the messaging service

use async_trait::async_trait;
use peerly_core::Notification;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Receives booking events after they happened.
///
/// Delivery is best effort: a failing notifier never undoes the booking
/// change that raised the event.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Fans notifications out to in-process subscribers
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// `capacity` is the number of events buffered per lagging subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        info!("notification channel initialized with capacity {}", capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        // No subscriber is not an error; the event is simply dropped
        match self.tx.send(notification.clone()) {
            Ok(count) => debug!(kind = ?notification.kind, booking = %notification.booking_id, "notified {} subscribers", count),
            Err(_) => debug!(kind = ?notification.kind, "no notification subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerly_core::{BookingRecord, NotificationKind, SlotId, StudentId, TutorId};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        let record = BookingRecord::new(
            TutorId::new("t1"),
            StudentId::new("st1"),
            "MT2013".to_string(),
            SlotId::new("s1"),
            false,
        );
        notifier.notify(&Notification::for_commit(&record)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::BookingConfirmed);
        assert_eq!(received.booking_id, record.id);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_fine() {
        let notifier = BroadcastNotifier::new(8);
        let record = BookingRecord::new(
            TutorId::new("t1"),
            StudentId::new("st1"),
            "MT2013".to_string(),
            SlotId::new("s1"),
            true,
        );
        assert!(notifier.notify(&Notification::for_commit(&record)).await.is_ok());
    }
}
