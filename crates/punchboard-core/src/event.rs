//! Event bus for punchboard using tokio::broadcast
//!
//! The store publishes a [`DashboardEvent`] after every state change so
//! front ends can redraw without polling.

use tokio::sync::broadcast;

use crate::models::EmployeeId;

/// Events emitted by the dashboard store
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// A dashboard load finished and its snapshot is now current
    DashboardLoaded { version: u64 },
    /// A newer load was started before this one finished; result dropped
    LoadSuperseded { version: u64 },
    /// Fetch failed; previous state is still shown
    LoadFailed(String),
    /// Drill-down opened for an employee
    EmployeeSelected(EmployeeId),
    /// Drill-down filters or page changed
    DetailUpdated,
    /// Drill-down discarded
    ReturnedToDashboard,
}

/// Event bus for broadcasting dashboard events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
