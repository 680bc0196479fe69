//! Progress notifications
//!

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info};

/// Receives progress of a running operation.
///
/// Notifications are one-way and may arrive from another thread, implementations should return
/// quickly.
pub trait ProgressObserver: Send + Sync {
    fn set_maximum(&self, maximum: usize);

    fn set_current(&self, current: usize);

    fn set_description(&self, description: &str);
}

/// Ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn set_maximum(&self, _maximum: usize) {}

    fn set_current(&self, _current: usize) {}

    fn set_description(&self, _description: &str) {}
}

/// Logs notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn set_maximum(&self, maximum: usize) {
        debug!("progress maximum {maximum}");
    }

    fn set_current(&self, current: usize) {
        debug!("progress {current}");
    }

    fn set_description(&self, description: &str) {
        info!("{description}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Maximum(usize),
    Current(usize),
    Description(String),
}

/// Forwards notifications to a [`Receiver`], usually owned by another thread
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: Sender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProgressEvent) {
        // Nobody is listening anymore
        let _ = self.sender.send(event);
    }
}

impl ProgressObserver for ChannelProgress {
    fn set_maximum(&self, maximum: usize) {
        self.send(ProgressEvent::Maximum(maximum));
    }

    fn set_current(&self, current: usize) {
        self.send(ProgressEvent::Current(current));
    }

    fn set_description(&self, description: &str) {
        self.send(ProgressEvent::Description(description.to_owned()));
    }
}
