use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use runout_watch::{NotificationSink, WatchError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fire-and-forget webhook notifier. One JSON POST per message, no retry,
/// no delivery guarantee.
pub struct WebhookNotifier {
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl NotificationSink for WebhookNotifier {
    fn send_message(&self, text: &str) -> Result<(), WatchError> {
        // Built per call on the reactor thread; the blocking client must
        // not live on an async runtime thread.
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WatchError::Notify(e.to_string()))?;
        let response = client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .map_err(|e| WatchError::Notify(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WatchError::Notify(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        debug!("notification delivered");
        Ok(())
    }
}

/// Sink used when no webhook is configured.
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn send_message(&self, text: &str) -> Result<(), WatchError> {
        debug!(message = text, "no notification sink configured, dropping message");
        Ok(())
    }
}
