//! Filament runout watch core.
//!
//! Watches a single filament-out sensor pin while a print is active,
//! debounces its falling edges, and reacts to a confirmed trip by pausing
//! the print and running the configured follow-up actions (notification,
//! homing, tool temperature). The host runtime owns the hardware and the
//! printer; it injects them through the [`SensorPort`], [`PrinterControl`]
//! and [`NotificationSink`] traits and drives session events through a
//! [`WatchHandle`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use runout_watch::{
//!     Axis, NotificationSink, PinLevel, PrinterControl, PullMode, RawEdge,
//!     SensorPort, SubscriptionId, TripReactor, WatchConfig, WatchError,
//! };
//!
//! struct Stub;
//!
//! impl SensorPort for Stub {
//!     fn read_level(&self, _pin: u8) -> Result<PinLevel, WatchError> {
//!         Ok(PinLevel::High)
//!     }
//!     fn subscribe_falling_edge(
//!         &self,
//!         _pin: u8,
//!         _pull: PullMode,
//!         _edges: mpsc::Sender<RawEdge>,
//!     ) -> Result<SubscriptionId, WatchError> {
//!         Ok(SubscriptionId(1))
//!     }
//!     fn unsubscribe(&self, _sub: SubscriptionId) -> Result<(), WatchError> {
//!         Ok(())
//!     }
//! }
//!
//! impl PrinterControl for Stub {
//!     fn is_printing(&self) -> bool {
//!         true
//!     }
//!     fn toggle_pause(&self) -> Result<(), WatchError> {
//!         Ok(())
//!     }
//!     fn home(&self, _axes: &[Axis]) -> Result<(), WatchError> {
//!         Ok(())
//!     }
//!     fn set_temperature(&self, _tool: &str, _degrees: f64) -> Result<(), WatchError> {
//!         Ok(())
//!     }
//! }
//!
//! impl NotificationSink for Stub {
//!     fn send_message(&self, _text: &str) -> Result<(), WatchError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = WatchConfig {
//!         pin: 17,
//!         ..Default::default()
//!     };
//!     let watch = TripReactor::spawn(
//!         config,
//!         Arc::new(Stub),
//!         Arc::new(Stub),
//!         Arc::new(Stub),
//!     )
//!     .unwrap();
//!
//!     // The host's event bus drives the session from here.
//!     watch.print_started().await.unwrap();
//!     watch.layer_change().await.unwrap();
//!     watch.print_stopped().await.unwrap();
//! }
//! ```

mod actions;
mod config;
mod debounce;
mod error;
mod ports;
mod reactor;
mod session;
#[cfg(test)]
mod test_support;

pub use actions::ActionRunner;
pub use config::WatchConfig;
pub use debounce::{EdgeDebouncer, TripEvent};
pub use error::WatchError;
pub use ports::{
    Axis, NotificationSink, PinLevel, PrinterControl, PullMode, RawEdge, SensorPort,
    SubscriptionId,
};
pub use reactor::{SensorStatus, TripReactor, WatchHandle};
pub use session::SessionTracker;
