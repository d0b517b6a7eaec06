use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::models::{Notice, NotificationKind};

/// Receives a notice for every mutation the store performs.
pub trait NotificationSink {
    fn add_notification(&mut self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn add_notification(&mut self, notice: Notice) {
        match notice.kind {
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = %notice.kind, "{}", notice.message)
            }
            NotificationKind::Warning => warn!(kind = %notice.kind, "{}", notice.message),
            NotificationKind::Error => error!(kind = %notice.kind, "{}", notice.message),
        }
    }
}

/// Collects notices in memory. Clones share the same list.
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl NotificationSink for NoticeLog {
    fn add_notification(&mut self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
