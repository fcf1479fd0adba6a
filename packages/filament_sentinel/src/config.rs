use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use runout_watch::{PullMode, WatchConfig};

// =============================================================================
// File config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Two equivalent ways to configure:
//
//   config.toml:     [sensor]
//                    pin = 17
//
//   env var:         SENTINEL_SENSOR__PIN=17   (double underscore = nesting)

/// Pull resistor spelling used in config files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PullSetting {
    Up,
    Down,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sensor: SensorFileConfig,
    #[serde(default)]
    pub behavior: BehaviorFileConfig,
    #[serde(default)]
    pub notify: NotifyFileConfig,
    #[serde(default)]
    pub printer: PrinterFileConfig,
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Sensor wiring (lives under `[sensor]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorFileConfig {
    /// Sensor pin, -1 disables the sensor.
    #[serde(default = "default_pin")]
    pub pin: i32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_pull")]
    pub pull: PullSetting,
}

impl Default for SensorFileConfig {
    fn default() -> Self {
        Self {
            pin: default_pin(),
            debounce_ms: default_debounce_ms(),
            pull: default_pull(),
        }
    }
}

/// Trip reaction knobs (lives under `[behavior]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BehaviorFileConfig {
    /// Defer the pause to the next layer change instead of pausing the
    /// moment the sensor trips.
    #[serde(default)]
    pub pause_inhibited: bool,
    #[serde(default = "default_true")]
    pub home_on_trip: bool,
    #[serde(default = "default_true")]
    pub set_temperature_on_trip: bool,
    #[serde(default = "default_target_temperature")]
    pub target_temperature: f64,
    #[serde(default = "default_tool")]
    pub tool: String,
}

impl Default for BehaviorFileConfig {
    fn default() -> Self {
        Self {
            pause_inhibited: false,
            home_on_trip: default_true(),
            set_temperature_on_trip: default_true(),
            target_temperature: default_target_temperature(),
            tool: default_tool(),
        }
    }
}

/// Notification settings (lives under `[notify]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyFileConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for NotifyFileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: default_message(),
            webhook_url: None,
        }
    }
}

/// Printer API endpoint (lives under `[printer]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrinterFileConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for PrinterFileConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
        }
    }
}

/// Listen address (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_pin() -> i32 {
    -1
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_pull() -> PullSetting {
    PullSetting::Down
}
fn default_true() -> bool {
    true
}
fn default_target_temperature() -> f64 {
    40.0
}
fn default_tool() -> String {
    "tool0".to_string()
}
fn default_message() -> String {
    "Filament runout detected".to_string()
}
fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5005
}

/// Build a figment that layers: defaults → config.toml → SENTINEL_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `SENTINEL_SENSOR__PIN=17`        →  `sensor.pin = 17`
///   `SENTINEL_NOTIFY__ENABLED=true`  →  `notify.enabled = true`
pub fn load_config(config_dir: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_dir.join("config.toml")))
        .merge(Env::prefixed("SENTINEL_").split("__"))
}

impl FileConfig {
    /// Runtime view handed to the watch core.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            pin: self.sensor.pin,
            debounce: Duration::from_millis(self.sensor.debounce_ms),
            pull: match self.sensor.pull {
                PullSetting::Up => PullMode::PullUp,
                PullSetting::Down => PullMode::PullDown,
            },
            pause_inhibited: self.behavior.pause_inhibited,
            notify_enabled: self.notify.enabled,
            message: self.notify.message.clone(),
            home_on_trip: self.behavior.home_on_trip,
            set_temperature_on_trip: self.behavior.set_temperature_on_trip,
            target_temperature: self.behavior.target_temperature,
            tool: self.behavior.tool.clone(),
        }
    }
}
