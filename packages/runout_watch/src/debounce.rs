use std::time::{Duration, Instant};

/// A debounced falling-edge occurrence: filament-out was recognized on `pin`.
#[derive(Clone, Copy, Debug)]
pub struct TripEvent {
    pub pin: u8,
    pub at: Instant,
}

/// Collapses bursts of raw falling edges into single trips.
///
/// The first edge emits a [`TripEvent`]; edges within `window` of the last
/// *emitted* trip are suppressed; after the window elapses the debouncer
/// re-arms.
#[derive(Debug)]
pub struct EdgeDebouncer {
    pin: u8,
    window: Duration,
    last_trip: Option<Instant>,
}

impl EdgeDebouncer {
    pub fn new(pin: u8, window: Duration) -> Self {
        Self {
            pin,
            window,
            last_trip: None,
        }
    }

    /// Feed one raw edge observed at `at`.
    pub fn accept(&mut self, at: Instant) -> Option<TripEvent> {
        if let Some(last) = self.last_trip {
            if at.duration_since(last) < self.window {
                return None;
            }
        }
        self.last_trip = Some(at);
        Some(TripEvent { pin: self.pin, at })
    }
}
