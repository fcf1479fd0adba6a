//! Recording collaborators shared by the in-crate tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::ports::{
    Axis, NotificationSink, PinLevel, PrinterControl, PullMode, RawEdge, SensorPort,
    SubscriptionId,
};

/// One collaborator call, recorded in global order across printer and
/// notifier so tests can assert the full action sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Pause,
    Notify(String),
    Home(Vec<Axis>),
    SetTemperature(String, f64),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct RecordingPrinter {
    pub calls: CallLog,
    pub printing: AtomicBool,
    pub fail_pause: AtomicBool,
}

impl RecordingPrinter {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            printing: AtomicBool::new(true),
            fail_pause: AtomicBool::new(false),
        }
    }
}

impl PrinterControl for RecordingPrinter {
    fn is_printing(&self) -> bool {
        self.printing.load(Ordering::SeqCst)
    }

    fn toggle_pause(&self) -> Result<(), WatchError> {
        self.calls.lock().unwrap().push(Call::Pause);
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(WatchError::Control("pause refused".to_string()));
        }
        Ok(())
    }

    fn home(&self, axes: &[Axis]) -> Result<(), WatchError> {
        self.calls.lock().unwrap().push(Call::Home(axes.to_vec()));
        Ok(())
    }

    fn set_temperature(&self, tool: &str, degrees: f64) -> Result<(), WatchError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SetTemperature(tool.to_string(), degrees));
        Ok(())
    }
}

pub struct RecordingNotifier {
    pub calls: CallLog,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            fail: AtomicBool::new(false),
        }
    }
}

impl NotificationSink for RecordingNotifier {
    fn send_message(&self, text: &str) -> Result<(), WatchError> {
        self.calls.lock().unwrap().push(Call::Notify(text.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(WatchError::Notify("sink unreachable".to_string()));
        }
        Ok(())
    }
}

pub struct MockSensor {
    pub level: Mutex<PinLevel>,
    pub read_fails: AtomicBool,
    pub subscriptions: Mutex<HashMap<SubscriptionId, mpsc::Sender<RawEdge>>>,
    pub unsubscribed: Mutex<Vec<SubscriptionId>>,
    next_id: AtomicU64,
}

impl MockSensor {
    pub fn new(level: PinLevel) -> Self {
        Self {
            level: Mutex::new(level),
            read_fails: AtomicBool::new(false),
            subscriptions: Mutex::new(HashMap::new()),
            unsubscribed: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    /// Fan a raw edge out to every live subscription.
    pub fn send_edge(&self, pin: u8) {
        for tx in self.subscriptions.lock().unwrap().values() {
            let _ = tx.try_send(RawEdge { pin });
        }
    }
}

impl SensorPort for MockSensor {
    fn read_level(&self, _pin: u8) -> Result<PinLevel, WatchError> {
        if self.read_fails.load(Ordering::SeqCst) {
            return Err(WatchError::Sensor("read failed".to_string()));
        }
        Ok(*self.level.lock().unwrap())
    }

    fn subscribe_falling_edge(
        &self,
        _pin: u8,
        _pull: PullMode,
        edges: mpsc::Sender<RawEdge>,
    ) -> Result<SubscriptionId, WatchError> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.lock().unwrap().insert(id, edges);
        Ok(id)
    }

    fn unsubscribe(&self, sub: SubscriptionId) -> Result<(), WatchError> {
        self.subscriptions.lock().unwrap().remove(&sub);
        self.unsubscribed.lock().unwrap().push(sub);
        Ok(())
    }
}
