//! In-process event bus over `tokio::sync::broadcast`.
//!
//! [`BroadcastBus`] is the [`EventBus`] used by the CLI. Publishing never
//! blocks and never fails: with no subscribers the event is dropped, and a
//! subscriber that falls more than `capacity` events behind skips ahead.
//! Listeners spawned with [`spawn_listener`] run on their own task, so a
//! failing or panicking listener cannot affect the save that published.

use std::future::Future;

use anyhow::Result;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use report_harness_core::events::{EventBus, ReportEvent};

#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<ReportEvent>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.sender.subscribe()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: ReportEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::debug!(
                topic = event.topic(),
                report_id = event.report_id(),
                "No subscribers for report event."
            );
        }
    }
}

/// Run `handler` for every event received on `rx` until the bus is dropped.
///
/// Handler errors are logged and the loop continues.
pub fn spawn_listener<F, Fut>(mut rx: broadcast::Receiver<ReportEvent>, handler: F) -> JoinHandle<()>
where
    F: Fn(ReportEvent) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let topic = event.topic();
                    let report_id = event.report_id().to_string();
                    if let Err(err) = handler(event).await {
                        tracing::warn!(topic, report_id = %report_id, error = %err, "Report event listener failed.");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Report event listener lagged; events dropped.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = BroadcastBus::new(4);
        bus.publish(ReportEvent::Created { id: "r1".into() });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = BroadcastBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(ReportEvent::Created { id: "r1".into() });
        bus.publish(ReportEvent::StatusChanged {
            id: "r1".into(),
            status: Some("closed".into()),
        });

        assert_eq!(rx.recv().await.unwrap().topic(), "report-created");
        assert_eq!(rx.recv().await.unwrap().topic(), "report-status-changed");
    }

    #[tokio::test]
    async fn test_listener_survives_handler_errors() {
        let bus = BroadcastBus::new(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = spawn_listener(bus.subscribe(), move |event| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(event.report_id().to_string());
                Err::<(), _>(anyhow::anyhow!("listener always fails"))
            }
        });

        bus.publish(ReportEvent::Created { id: "a".into() });
        bus.publish(ReportEvent::Created { id: "b".into() });
        drop(bus);
        handle.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
