use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use runout_watch::{PinLevel, PullMode, RawEdge, SensorPort, SubscriptionId, WatchError};

/// In-memory sensor port used when no hardware is wired in.
///
/// The level is driven over the HTTP surface; dropping it from present to
/// absent fans a raw falling edge out to every subscriber. A real
/// deployment swaps this for a hardware-backed [`SensorPort`].
pub struct SimulatedSensorPort {
    level: Mutex<PinLevel>,
    subscribers: Mutex<HashMap<SubscriptionId, (u8, mpsc::Sender<RawEdge>)>>,
    next_id: AtomicU64,
}

impl SimulatedSensorPort {
    pub fn new(initial: PinLevel) -> Self {
        Self {
            level: Mutex::new(initial),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Set the simulated level. Only a High→Low transition emits edges.
    pub fn set_level(&self, level: PinLevel) {
        let previous = {
            let mut current = self.level.lock().unwrap();
            std::mem::replace(&mut *current, level)
        };
        if previous == PinLevel::High && level == PinLevel::Low {
            for (id, (pin, tx)) in self.subscribers.lock().unwrap().iter() {
                if tx.try_send(RawEdge { pin: *pin }).is_err() {
                    debug!(sub = %id, "edge dropped, subscriber queue full or gone");
                }
            }
        }
    }
}

impl SensorPort for SimulatedSensorPort {
    fn read_level(&self, _pin: u8) -> Result<PinLevel, WatchError> {
        Ok(*self.level.lock().unwrap())
    }

    fn subscribe_falling_edge(
        &self,
        pin: u8,
        _pull: PullMode,
        edges: mpsc::Sender<RawEdge>,
    ) -> Result<SubscriptionId, WatchError> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.lock().unwrap().insert(id, (pin, edges));
        debug!(sub = %id, pin, "edge subscription added");
        Ok(id)
    }

    fn unsubscribe(&self, sub: SubscriptionId) -> Result<(), WatchError> {
        // Removal is best effort; stale handles are fine.
        self.subscribers.lock().unwrap().remove(&sub);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_transition_emits_an_edge() {
        let port = SimulatedSensorPort::new(PinLevel::High);
        let (tx, mut rx) = mpsc::channel(4);
        port.subscribe_falling_edge(17, PullMode::PullDown, tx).unwrap();

        port.set_level(PinLevel::Low);
        let edge = rx.try_recv().unwrap();
        assert_eq!(edge.pin, 17);
    }

    #[test]
    fn repeated_low_does_not_emit() {
        let port = SimulatedSensorPort::new(PinLevel::Low);
        let (tx, mut rx) = mpsc::channel(4);
        port.subscribe_falling_edge(17, PullMode::PullDown, tx).unwrap();

        port.set_level(PinLevel::Low);
        assert!(rx.try_recv().is_err());

        // Rising transition is not a falling edge either.
        port.set_level(PinLevel::High);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribe_tolerates_stale_handles() {
        let port = SimulatedSensorPort::new(PinLevel::High);
        let (tx, mut rx) = mpsc::channel(4);
        let sub = port
            .subscribe_falling_edge(4, PullMode::PullUp, tx)
            .unwrap();
        port.unsubscribe(sub).unwrap();
        port.unsubscribe(sub).unwrap();
        port.unsubscribe(SubscriptionId(999)).unwrap();

        port.set_level(PinLevel::Low);
        assert!(rx.try_recv().is_err());
    }
}
