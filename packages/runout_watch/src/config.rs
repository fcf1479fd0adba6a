use std::time::Duration;

use crate::error::WatchError;
use crate::ports::PullMode;

/// Highest pin number the watch accepts.
const MAX_PIN: i32 = 40;

/// Per-session watch configuration. Loaded once when the reactor is
/// created and immutable while a print is running.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Sensor pin; -1 disables the sensor entirely.
    pub pin: i32,
    /// Minimum separation between accepted edges on the pin.
    pub debounce: Duration,
    pub pull: PullMode,
    /// When true a trip never pauses immediately; the pause is deferred
    /// to the next layer change.
    pub pause_inhibited: bool,
    pub notify_enabled: bool,
    pub message: String,
    pub home_on_trip: bool,
    pub set_temperature_on_trip: bool,
    pub target_temperature: f64,
    pub tool: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            pin: -1,
            debounce: Duration::from_millis(300),
            pull: PullMode::PullDown,
            pause_inhibited: false,
            notify_enabled: false,
            message: "Filament runout detected".to_string(),
            home_on_trip: true,
            set_temperature_on_trip: true,
            target_temperature: 40.0,
            tool: "tool0".to_string(),
        }
    }
}

impl WatchConfig {
    /// Reject impossible pins up front, once, at startup.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.pin < -1 || self.pin > MAX_PIN {
            return Err(WatchError::InvalidPin(self.pin));
        }
        Ok(())
    }

    /// The sensor pin, or None when the sensor is disabled.
    pub fn enabled_pin(&self) -> Option<u8> {
        u8::try_from(self.pin).ok()
    }
}
