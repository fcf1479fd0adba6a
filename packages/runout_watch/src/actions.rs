use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::WatchConfig;
use crate::ports::{Axis, NotificationSink, PrinterControl};

/// Runs the side effects of a trip in fixed order: pause toggle,
/// notification, homing, tool temperature.
///
/// Every step is independently guarded; a failing call is logged and the
/// sequence continues. The runner owns its collaborators explicitly, there
/// is no process-wide notification client.
pub struct ActionRunner {
    printer: Arc<dyn PrinterControl>,
    notifier: Arc<dyn NotificationSink>,
    notify_enabled: bool,
    message: String,
    home_on_trip: bool,
    set_temperature_on_trip: bool,
    target_temperature: f64,
    tool: String,
}

impl ActionRunner {
    pub fn new(
        config: &WatchConfig,
        printer: Arc<dyn PrinterControl>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            printer,
            notifier,
            notify_enabled: config.notify_enabled,
            message: config.message.clone(),
            home_on_trip: config.home_on_trip,
            set_temperature_on_trip: config.set_temperature_on_trip,
            target_temperature: config.target_temperature,
            tool: config.tool.clone(),
        }
    }

    /// Execute the configured action sequence. Never fails, never panics.
    pub fn run(&self) {
        if let Err(e) = self.printer.toggle_pause() {
            warn!("pause toggle failed: {e}");
        }
        if self.notify_enabled {
            if let Err(e) = self.notifier.send_message(&self.message) {
                warn!("notification failed: {e}");
            }
        }
        if self.home_on_trip {
            if let Err(e) = self.printer.home(&[Axis::X, Axis::Y]) {
                warn!("homing failed: {e}");
            }
        }
        if self.set_temperature_on_trip {
            if let Err(e) = self
                .printer
                .set_temperature(&self.tool, self.target_temperature)
            {
                warn!("set temperature failed: {e}");
            }
        }
        debug!("trip action sequence completed");
    }
}
