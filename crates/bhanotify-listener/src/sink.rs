use std::sync::mpsc::Sender;

use crate::error::{ListenerError, Result};
use crate::pipeline::Notification;

/// Consumer of classified events. The last, side-effecting pipeline step.
pub trait EventSink {
    fn on_event(&mut self, notification: Notification) -> Result<()>;
}

/// Forward events to another thread. Fails once the receiver is dropped.
impl EventSink for Sender<Notification> {
    fn on_event(&mut self, notification: Notification) -> Result<()> {
        self.send(notification)
            .map_err(|_| ListenerError::SinkClosed)
    }
}

/// Collect events in memory.
impl EventSink for Vec<Notification> {
    fn on_event(&mut self, notification: Notification) -> Result<()> {
        self.push(notification);
        Ok(())
    }
}
