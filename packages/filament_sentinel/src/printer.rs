use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use runout_watch::{Axis, PrinterControl, WatchError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// [`PrinterControl`] adapter for an OctoPrint-compatible REST API.
pub struct OctoPrinterControl {
    api_url: String,
    api_key: Option<String>,
}

impl OctoPrinterControl {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self { api_url, api_key }
    }

    // The blocking client must never be created or used on an async
    // runtime thread; all calls here run on the reactor thread.
    fn client(&self) -> Result<Client, WatchError> {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WatchError::Control(e.to_string()))
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<(), WatchError> {
        let mut request = self
            .client()?
            .post(format!("{}{}", self.api_url, path))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }
        let response = request
            .send()
            .map_err(|e| WatchError::Control(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WatchError::Control(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }
}

impl PrinterControl for OctoPrinterControl {
    fn is_printing(&self) -> bool {
        let job = self.client().and_then(|client| {
            let mut request = client.get(format!("{}/api/job", self.api_url));
            if let Some(key) = &self.api_key {
                request = request.header("X-Api-Key", key);
            }
            request
                .send()
                .and_then(|r| r.json::<serde_json::Value>())
                .map_err(|e| WatchError::Control(e.to_string()))
        });
        match job {
            Ok(job) => job["state"]
                .as_str()
                .is_some_and(|s| s.starts_with("Printing")),
            Err(e) => {
                debug!("job state query failed: {e}");
                false
            }
        }
    }

    fn toggle_pause(&self) -> Result<(), WatchError> {
        self.post("/api/job", json!({ "command": "pause", "action": "toggle" }))
    }

    fn home(&self, axes: &[Axis]) -> Result<(), WatchError> {
        let axes: Vec<&str> = axes.iter().map(Axis::as_str).collect();
        self.post(
            "/api/printer/printhead",
            json!({ "command": "home", "axes": axes }),
        )
    }

    fn set_temperature(&self, tool: &str, degrees: f64) -> Result<(), WatchError> {
        self.post(
            "/api/printer/tool",
            json!({ "command": "target", "targets": { tool: degrees } }),
        )
    }
}
