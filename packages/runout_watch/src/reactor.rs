use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::actions::ActionRunner;
use crate::config::WatchConfig;
use crate::debounce::{EdgeDebouncer, TripEvent};
use crate::error::WatchError;
use crate::ports::{NotificationSink, PinLevel, PrinterControl, SensorPort, SubscriptionId};
use crate::session::SessionTracker;

const COMMAND_QUEUE_DEPTH: usize = 32;
const EDGE_QUEUE_DEPTH: usize = 16;

/// Sensor status as reported to the host's status surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorStatus {
    Disabled,
    FilamentOut,
    FilamentPresent,
}

impl SensorStatus {
    /// Wire encoding of the status route: -1 disabled, 0 out, 1 present.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Disabled => "-1",
            SensorStatus::FilamentOut => "0",
            SensorStatus::FilamentPresent => "1",
        }
    }
}

/// Commands processed by the reactor. Session events and debounced trips
/// share one queue, so trip handling is never concurrent with a
/// session-state transition.
enum WatchCommand {
    PrintStarted,
    PrintStopped,
    LayerChange,
    Trip(TripEvent),
    Status {
        respond_to: oneshot::Sender<SensorStatus>,
    },
}

/// Handle the host drives from its event callbacks.
#[derive(Clone)]
pub struct WatchHandle {
    sender: mpsc::Sender<WatchCommand>,
}

impl WatchHandle {
    pub async fn print_started(&self) -> Result<(), WatchError> {
        self.sender
            .send(WatchCommand::PrintStarted)
            .await
            .map_err(|_| WatchError::ChannelClosed)
    }

    pub async fn print_stopped(&self) -> Result<(), WatchError> {
        self.sender
            .send(WatchCommand::PrintStopped)
            .await
            .map_err(|_| WatchError::ChannelClosed)
    }

    pub async fn layer_change(&self) -> Result<(), WatchError> {
        self.sender
            .send(WatchCommand::LayerChange)
            .await
            .map_err(|_| WatchError::ChannelClosed)
    }

    /// Read the sensor status through the reactor's serialized queue.
    pub async fn status(&self) -> Result<SensorStatus, WatchError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WatchCommand::Status { respond_to: tx })
            .await
            .map_err(|_| WatchError::ChannelClosed)?;
        rx.await.map_err(|_| WatchError::ChannelClosed)
    }
}

/// The core state machine: consumes debounced trips plus session state and
/// decides between ignore, act now, and defer to the next layer change.
///
/// Runs on a dedicated thread so the synchronous collaborator calls
/// (printer, notifier) never execute inside an async runtime.
pub struct TripReactor {
    config: WatchConfig,
    sensor: Arc<dyn SensorPort>,
    printer: Arc<dyn PrinterControl>,
    actions: ActionRunner,
    session: SessionTracker,
    subscription: Option<SubscriptionId>,
    trips: mpsc::WeakSender<WatchCommand>,
    receiver: mpsc::Receiver<WatchCommand>,
}

impl TripReactor {
    /// Validate the configuration, start the reactor thread, and return
    /// the handle the host drives.
    pub fn spawn(
        config: WatchConfig,
        sensor: Arc<dyn SensorPort>,
        printer: Arc<dyn PrinterControl>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<WatchHandle, WatchError> {
        let (mut reactor, handle) = Self::new(config, sensor, printer, notifier)?;
        std::thread::spawn(move || reactor.run());
        Ok(handle)
    }

    fn new(
        config: WatchConfig,
        sensor: Arc<dyn SensorPort>,
        printer: Arc<dyn PrinterControl>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<(Self, WatchHandle), WatchError> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let actions = ActionRunner::new(&config, printer.clone(), notifier);
        let reactor = Self {
            config,
            sensor,
            printer,
            actions,
            session: SessionTracker::new(),
            subscription: None,
            trips: sender.downgrade(),
            receiver,
        };
        Ok((reactor, WatchHandle { sender }))
    }

    /// Runs until every [`WatchHandle`] is dropped.
    fn run(&mut self) {
        info!(pin = self.config.pin, "trip reactor started");
        while let Some(cmd) = self.receiver.blocking_recv() {
            match cmd {
                WatchCommand::PrintStarted => self.handle_print_started(),
                WatchCommand::PrintStopped => self.handle_print_stopped(),
                WatchCommand::LayerChange => self.handle_layer_change(),
                WatchCommand::Trip(trip) => self.handle_trip(trip),
                WatchCommand::Status { respond_to } => {
                    let _ = respond_to.send(self.read_status());
                }
            }
        }
        self.disarm();
        info!("trip reactor stopped");
    }

    fn handle_print_started(&mut self) {
        info!("print started, filament sensor enabled");
        self.session.start();
        self.arm();
    }

    fn handle_print_stopped(&mut self) {
        info!("print stopped, filament sensor disabled");
        self.session.stop();
        self.disarm();
    }

    fn handle_layer_change(&mut self) {
        // The sensor is deliberately not re-read here: the deferred trip
        // stays valid even if the filament was reseated meanwhile.
        if self.session.take_deferred_pause() {
            info!("layer change reached with a pending deferred pause, acting now");
            self.actions.run();
        }
    }

    fn handle_trip(&mut self, trip: TripEvent) {
        if !self.session.is_active() {
            debug!(pin = trip.pin, "trip outside an active session, discarding");
            return;
        }
        // Re-read the pin before acting. An unreadable pin counts as
        // filament-out: the trip path may over-pause but never under-pause.
        let still_out = match self.sensor.read_level(trip.pin) {
            Ok(PinLevel::Low) => true,
            Ok(PinLevel::High) => false,
            Err(e) => {
                warn!(pin = trip.pin, "pin re-read failed, assuming filament-out: {e}");
                true
            }
        };
        if !still_out {
            debug!(pin = trip.pin, "filament re-appeared before the trip was handled");
            return;
        }
        if !self.printer.is_printing() {
            debug!(pin = trip.pin, "trip while the printer is not printing, discarding");
            return;
        }
        if self.config.pause_inhibited {
            info!(pin = trip.pin, "filament out, deferring pause to the next layer change");
            self.session.defer_pause();
        } else {
            info!(pin = trip.pin, "filament out, pausing print");
            self.actions.run();
        }
    }

    /// (Re)subscribe to falling edges, atomically replacing any previous
    /// subscription so repeated print-started events never leave two
    /// active subscriptions behind.
    fn arm(&mut self) {
        self.disarm();
        let Some(pin) = self.config.enabled_pin() else {
            debug!("sensor pin disabled, not arming");
            return;
        };
        let (edge_tx, mut edge_rx) = mpsc::channel(EDGE_QUEUE_DEPTH);
        let subscription = match self.sensor.subscribe_falling_edge(pin, self.config.pull, edge_tx)
        {
            Ok(sub) => sub,
            Err(e) => {
                warn!(pin, "failed to subscribe to falling edges: {e}");
                return;
            }
        };
        let mut debouncer = EdgeDebouncer::new(pin, self.config.debounce);
        let trips = self.trips.clone();
        std::thread::spawn(move || {
            while let Some(edge) = edge_rx.blocking_recv() {
                if let Some(trip) = debouncer.accept(Instant::now()) {
                    debug!(pin = edge.pin, "debounced falling edge");
                    let Some(trips) = trips.upgrade() else { break };
                    if trips.blocking_send(WatchCommand::Trip(trip)).is_err() {
                        break;
                    }
                }
            }
        });
        info!(pin, sub = %subscription, "sensor armed");
        self.subscription = Some(subscription);
    }

    fn disarm(&mut self) {
        if let Some(sub) = self.subscription.take() {
            // Non-fatal: the handle may already be gone on the host side.
            if let Err(e) = self.sensor.unsubscribe(sub) {
                warn!(sub = %sub, "unsubscribe failed: {e}");
            }
        }
    }

    fn read_status(&self) -> SensorStatus {
        let Some(pin) = self.config.enabled_pin() else {
            return SensorStatus::Disabled;
        };
        match self.sensor.read_level(pin) {
            Ok(PinLevel::High) => SensorStatus::FilamentPresent,
            Ok(PinLevel::Low) => SensorStatus::FilamentOut,
            Err(e) => {
                warn!(pin, "status read failed, reporting filament-out: {e}");
                SensorStatus::FilamentOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, CallLog, MockSensor, RecordingNotifier, RecordingPrinter, call_log};
    use crate::ports::Axis;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Rig {
        reactor: TripReactor,
        handle: WatchHandle,
        sensor: Arc<MockSensor>,
        printer: Arc<RecordingPrinter>,
        calls: CallLog,
    }

    fn rig(config: WatchConfig) -> Rig {
        let calls = call_log();
        let sensor = Arc::new(MockSensor::new(PinLevel::Low));
        let printer = Arc::new(RecordingPrinter::new(calls.clone()));
        let notifier = Arc::new(RecordingNotifier::new(calls.clone()));
        let (reactor, handle) =
            TripReactor::new(config, sensor.clone(), printer.clone(), notifier).unwrap();
        Rig {
            reactor,
            handle,
            sensor,
            printer,
            calls,
        }
    }

    fn armed_config() -> WatchConfig {
        WatchConfig {
            pin: 17,
            notify_enabled: true,
            ..Default::default()
        }
    }

    fn trip(pin: u8) -> TripEvent {
        TripEvent {
            pin,
            at: Instant::now(),
        }
    }

    fn full_sequence() -> Vec<Call> {
        vec![
            Call::Pause,
            Call::Notify("Filament runout detected".to_string()),
            Call::Home(vec![Axis::X, Axis::Y]),
            Call::SetTemperature("tool0".to_string(), 40.0),
        ]
    }

    #[test]
    fn spawn_rejects_invalid_pin() {
        let config = WatchConfig {
            pin: 99,
            ..Default::default()
        };
        let calls = call_log();
        let err = TripReactor::new(
            config,
            Arc::new(MockSensor::new(PinLevel::High)),
            Arc::new(RecordingPrinter::new(calls.clone())),
            Arc::new(RecordingNotifier::new(calls)),
        )
        .err()
        .unwrap();
        assert!(matches!(err, WatchError::InvalidPin(99)));
    }

    #[test]
    fn trip_outside_session_is_a_no_op() {
        let mut r = rig(armed_config());
        r.reactor.handle_trip(trip(17));
        assert!(r.calls.lock().unwrap().is_empty());
        assert!(!r.reactor.session.deferred_pause());
    }

    #[test]
    fn trip_runs_full_sequence_in_order() {
        let mut r = rig(armed_config());
        r.reactor.handle_print_started();
        r.reactor.handle_trip(trip(17));
        assert_eq!(*r.calls.lock().unwrap(), full_sequence());
        // Immediate path leaves no deferred pause behind.
        assert!(!r.reactor.session.deferred_pause());
    }

    #[test]
    fn inhibited_trip_defers_until_layer_change() {
        let mut r = rig(WatchConfig {
            pause_inhibited: true,
            ..armed_config()
        });
        r.reactor.handle_print_started();
        r.reactor.handle_trip(trip(17));
        assert!(r.calls.lock().unwrap().is_empty());
        assert!(r.reactor.session.deferred_pause());

        r.reactor.handle_layer_change();
        assert_eq!(*r.calls.lock().unwrap(), full_sequence());
        assert!(!r.reactor.session.deferred_pause());

        // A second layer change with nothing deferred does nothing.
        r.reactor.handle_layer_change();
        assert_eq!(r.calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn stop_clears_deferred_pause_and_disarms() {
        let mut r = rig(WatchConfig {
            pause_inhibited: true,
            ..armed_config()
        });
        r.reactor.handle_print_started();
        r.reactor.handle_trip(trip(17));
        assert!(r.reactor.session.deferred_pause());

        r.reactor.handle_print_stopped();
        assert!(!r.reactor.session.deferred_pause());
        assert_eq!(r.sensor.active_subscriptions(), 0);

        // A stale trip racing with the disarm must not act.
        r.reactor.handle_trip(trip(17));
        r.reactor.handle_layer_change();
        assert!(r.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn disabled_pin_never_subscribes() {
        let mut r = rig(WatchConfig {
            pin: -1,
            ..armed_config()
        });
        r.reactor.handle_print_started();
        assert_eq!(r.sensor.active_subscriptions(), 0);
        assert_eq!(r.reactor.read_status(), SensorStatus::Disabled);
    }

    #[test]
    fn rearm_replaces_the_previous_subscription() {
        let mut r = rig(armed_config());
        r.reactor.handle_print_started();
        r.reactor.handle_print_started();
        assert_eq!(r.sensor.active_subscriptions(), 1);
        assert_eq!(r.sensor.unsubscribed.lock().unwrap().len(), 1);
    }

    #[test]
    fn reappeared_filament_discards_the_trip() {
        let mut r = rig(armed_config());
        r.reactor.handle_print_started();
        *r.sensor.level.lock().unwrap() = PinLevel::High;
        r.reactor.handle_trip(trip(17));
        assert!(r.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn unreadable_pin_fails_open() {
        let mut r = rig(armed_config());
        r.reactor.handle_print_started();
        r.sensor.read_fails.store(true, Ordering::SeqCst);
        r.reactor.handle_trip(trip(17));
        assert_eq!(*r.calls.lock().unwrap(), full_sequence());
    }

    #[test]
    fn idle_printer_discards_the_trip() {
        let mut r = rig(armed_config());
        r.reactor.handle_print_started();
        r.printer.printing.store(false, Ordering::SeqCst);
        r.reactor.handle_trip(trip(17));
        assert!(r.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn status_maps_levels_to_wire_codes() {
        let r = rig(armed_config());
        assert_eq!(r.reactor.read_status(), SensorStatus::FilamentOut);
        *r.sensor.level.lock().unwrap() = PinLevel::High;
        assert_eq!(r.reactor.read_status(), SensorStatus::FilamentPresent);
        r.sensor.read_fails.store(true, Ordering::SeqCst);
        assert_eq!(r.reactor.read_status(), SensorStatus::FilamentOut);
        assert_eq!(SensorStatus::Disabled.as_str(), "-1");
        assert_eq!(SensorStatus::FilamentOut.as_str(), "0");
        assert_eq!(SensorStatus::FilamentPresent.as_str(), "1");
        drop(r.handle);
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn edge_burst_ends_in_one_action_sequence() {
        let calls = call_log();
        let sensor = Arc::new(MockSensor::new(PinLevel::Low));
        let printer = Arc::new(RecordingPrinter::new(calls.clone()));
        let notifier = Arc::new(RecordingNotifier::new(calls.clone()));
        let handle = TripReactor::spawn(
            armed_config(),
            sensor.clone(),
            printer,
            notifier,
        )
        .unwrap();

        handle.print_started().await.unwrap();
        {
            let sensor = sensor.clone();
            wait_until(move || sensor.active_subscriptions() == 1).await;
        }

        // Electrical bounce: three edges well inside the 300 ms window.
        sensor.send_edge(17);
        sensor.send_edge(17);
        sensor.send_edge(17);

        {
            let calls = calls.clone();
            wait_until(move || calls.lock().unwrap().len() == 4).await;
        }
        let recorded = calls.lock().unwrap().clone();
        assert_eq!(recorded.iter().filter(|c| **c == Call::Pause).count(), 1);

        handle.print_stopped().await.unwrap();
        {
            let sensor = sensor.clone();
            wait_until(move || sensor.active_subscriptions() == 0).await;
        }
        assert_eq!(handle.status().await.unwrap(), SensorStatus::FilamentOut);
    }
}
