//! Notification side channel — every notice is logged, and broadcast to the
//! toast layer when verbose notifications are on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::events::{FollowupEvent, NoticeData};
use crate::types::Severity;

#[derive(Clone)]
pub struct Notifier {
    events: broadcast::Sender<FollowupEvent>,
    verbose: Arc<AtomicBool>,
}

impl Notifier {
    pub fn new(events: broadcast::Sender<FollowupEvent>, verbose: bool) -> Self {
        Self {
            events,
            verbose: Arc::new(AtomicBool::new(verbose)),
        }
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info | Severity::Success => info!("{}", message),
            Severity::Warn => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
        if self.is_verbose() {
            let _ = self
                .events
                .send(FollowupEvent::Notice(NoticeData { severity, message }));
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Severity::Success, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.notify(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Severity::Error, message);
    }
}
