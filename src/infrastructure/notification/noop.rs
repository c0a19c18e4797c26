//! Silent notifier, used when notifications are off

use async_trait::async_trait;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

pub struct NoOpNotifier;

impl NoOpNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(
        &self,
        _title: &str,
        _message: &str,
        _icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_returns_ok() {
        let notifier = NoOpNotifier::new();
        assert!(notifier
            .notify("Saved", "en_GEN_1_1.m4a", NotificationIcon::Saved)
            .await
            .is_ok());
        assert!(notifier
            .notify("Failed", "no device", NotificationIcon::Error)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn factory_respects_flag() {
        let notifier = super::super::create_notifier(false);
        assert!(notifier
            .notify("Recording", "GEN 1:1", NotificationIcon::Recording)
            .await
            .is_ok());
    }
}
