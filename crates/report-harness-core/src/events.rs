//! Report lifecycle events and the bus they are published on.
//!
//! At most one [`ReportEvent`] is published per successful save. Delivery is
//! fire-and-forget: [`EventBus::publish`] returns nothing, and a bus must
//! never let a listener failure reach the publisher.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use anyhow::Result;
use serde::Serialize;

pub const TOPIC_REPORT_CREATED: &str = "report-created";
pub const TOPIC_REPORT_STATUS_CHANGED: &str = "report-status-changed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "topic")]
pub enum ReportEvent {
    /// The report was committed for the first time.
    #[serde(rename = "report-created")]
    Created { id: String },
    /// An existing report was committed with a different status.
    #[serde(rename = "report-status-changed")]
    StatusChanged { id: String, status: Option<String> },
}

impl ReportEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            ReportEvent::Created { .. } => TOPIC_REPORT_CREATED,
            ReportEvent::StatusChanged { .. } => TOPIC_REPORT_STATUS_CHANGED,
        }
    }

    pub fn report_id(&self) -> &str {
        match self {
            ReportEvent::Created { id } | ReportEvent::StatusChanged { id, .. } => id,
        }
    }
}

/// Destination for report events.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: ReportEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&self, _event: ReportEvent) {}
}

/// Keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingBus {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Remove and return the events published so far.
    pub fn take(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl EventBus for RecordingBus {
    fn publish(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

type Listener = Box<dyn Fn(&ReportEvent) -> Result<()> + Send + Sync>;

/// Calls registered listeners in registration order.
///
/// A listener that returns an error or panics is logged and skipped; the
/// remaining listeners still run and the publisher never sees the failure.
#[derive(Default)]
pub struct ListenerBus {
    listeners: Vec<Listener>,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ReportEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
        self
    }
}

impl EventBus for ListenerBus {
    fn publish(&self, event: ReportEvent) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let error = match panic::catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{:#}", err),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            tracing::warn!(
                listener = index,
                topic = event.topic(),
                report_id = event.report_id(),
                error = %error,
                "Report event listener failed."
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
