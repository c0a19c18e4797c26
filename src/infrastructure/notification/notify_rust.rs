//! notify-rust notification adapter

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};
use tracing::debug;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

/// How long a notification stays on screen
const DEFAULT_EXPIRE_MS: u32 = 4_000;

/// Desktop notifier over notify-rust (D-Bus on Linux, native elsewhere)
pub struct NotifyRustNotifier {
    app_name: String,
    expire_ms: u32,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self::with_app_name("Verse Recorder")
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            expire_ms: DEFAULT_EXPIRE_MS,
        }
    }

    /// Override the on-screen time
    pub fn expire_after(mut self, millis: u32) -> Self {
        self.expire_ms = millis;
        self
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .icon(icon.icon_name())
            .timeout(Timeout::Milliseconds(self.expire_ms));
        debug!(title, icon = icon.icon_name(), "sending notification");

        // D-Bus round trip blocks
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}
