//! Collaborator interfaces owned by the host runtime.
//!
//! The core never talks to hardware or to the printer directly; the host
//! injects these as `Arc<dyn …>` when spawning the reactor.

use std::fmt;

use tokio::sync::mpsc;

use crate::error::WatchError;

/// Raw, unfiltered falling-edge notification from the sensor hardware.
/// Debouncing is the core's job, not the port's.
#[derive(Clone, Copy, Debug)]
pub struct RawEdge {
    pub pin: u8,
}

/// Electrical level of the sensor pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinLevel {
    /// Filament present.
    High,
    /// Filament out.
    Low,
}

/// Pull resistor wiring of the sensor pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PullMode {
    PullUp,
    #[default]
    PullDown,
}

/// Opaque handle for an active edge subscription.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Axes that can be homed after a trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// Hardware abstraction over the filament sensor pin.
pub trait SensorPort: Send + Sync {
    /// Read the current electrical level of the pin.
    fn read_level(&self, pin: u8) -> Result<PinLevel, WatchError>;

    /// Start delivering raw falling edges for `pin` into `edges`.
    /// Each call creates an independent subscription.
    fn subscribe_falling_edge(
        &self,
        pin: u8,
        pull: PullMode,
        edges: mpsc::Sender<RawEdge>,
    ) -> Result<SubscriptionId, WatchError>;

    /// Stop a subscription. Must tolerate stale or unknown handles.
    fn unsubscribe(&self, sub: SubscriptionId) -> Result<(), WatchError>;
}

/// Narrow view of the printer the watch acts on.
pub trait PrinterControl: Send + Sync {
    fn is_printing(&self) -> bool;

    fn toggle_pause(&self) -> Result<(), WatchError>;

    fn home(&self, axes: &[Axis]) -> Result<(), WatchError>;

    fn set_temperature(&self, tool: &str, degrees: f64) -> Result<(), WatchError>;
}

/// Fire-and-forget message delivery. No delivery guarantee.
pub trait NotificationSink: Send + Sync {
    fn send_message(&self, text: &str) -> Result<(), WatchError>;
}
