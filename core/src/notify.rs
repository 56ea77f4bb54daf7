//! Transient user notifications.

use tracing::info;

use crate::types::Toast;

/// Presents a toast to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: &Toast);
}

/// Notifier for headless hosts: toasts become log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: &Toast) {
        info!(
            target: "notify",
            position = ?toast.position,
            duration_ms = ?toast.duration_ms,
            "{}",
            toast.message
        );
    }
}
