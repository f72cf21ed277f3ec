use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::ports::StatusReporter;
use crate::domain::{StageEvent, StageStatus};

/// Writes every stage transition to the log.
pub struct TracingStatusReporter;

impl StatusReporter for TracingStatusReporter {
    fn report(&self, event: &StageEvent) {
        match event.status {
            StageStatus::Error => error!(
                stage = event.stage.index(),
                status = event.status.as_str(),
                "{}: {}",
                event.label,
                event.detail
            ),
            _ => info!(
                stage = event.stage.index(),
                status = event.status.as_str(),
                "{}: {}",
                event.label,
                event.detail
            ),
        }
    }
}

/// Forwards stage transitions to an async consumer.
///
/// Events are dropped once the receiver is gone; reporting never blocks the
/// pipeline.
pub struct ChannelStatusReporter {
    sender: mpsc::UnboundedSender<StageEvent>,
}

impl ChannelStatusReporter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StageEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StatusReporter for ChannelStatusReporter {
    fn report(&self, event: &StageEvent) {
        let _ = self.sender.send(event.clone());
    }
}
