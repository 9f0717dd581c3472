//! User-facing progress notifications for exports.

use std::sync::Mutex;

use log::{error, info};

/// Receives the lifecycle of one export: `loading`, then `dismiss`, then
/// exactly one of `success` or `error`.
pub trait Notifier: Send + Sync {
    fn loading(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn dismiss(&self);
}

/// Routes notifications into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn loading(&self, message: &str) {
        info!("{message}");
    }

    fn success(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn dismiss(&self) {}
}

/// A single recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Loading(String),
    Success(String),
    Error(String),
    Dismiss,
}

/// Keeps every notification in order; used to observe exports in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn push(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn loading(&self, message: &str) {
        self.push(Notice::Loading(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notice::Error(message.to_string()));
    }

    fn dismiss(&self) {
        self.push(Notice::Dismiss);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let n = RecordingNotifier::new();
        n.loading("Generating PDF...");
        n.dismiss();
        n.success("PDF downloaded successfully");
        assert_eq!(
            n.notices(),
            vec![
                Notice::Loading("Generating PDF...".into()),
                Notice::Dismiss,
                Notice::Success("PDF downloaded successfully".into()),
            ]
        );
    }
}
