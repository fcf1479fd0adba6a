use tracing::debug;

/// Tracks whether a print is active and whether a trip's pause has been
/// postponed to the next layer change.
///
/// The deferred-pause flag can only be set while a session is active, and
/// stopping a session always clears it.
#[derive(Debug, Default)]
pub struct SessionTracker {
    active: bool,
    deferred_pause: bool,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print started: fresh session, no pending deferred pause.
    pub fn start(&mut self) {
        self.active = true;
        self.deferred_pause = false;
    }

    /// Print done, failed, or cancelled.
    pub fn stop(&mut self) {
        self.active = false;
        self.deferred_pause = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deferred_pause(&self) -> bool {
        self.deferred_pause
    }

    /// Postpone the trip's pause to the next layer change.
    pub fn defer_pause(&mut self) {
        if !self.active {
            debug!("defer_pause outside an active session, ignoring");
            return;
        }
        self.deferred_pause = true;
    }

    /// Consume the deferred-pause flag, returning whether it was set.
    pub fn take_deferred_pause(&mut self) -> bool {
        std::mem::take(&mut self.deferred_pause)
    }
}
