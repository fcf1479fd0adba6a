use thiserror::Error;

/// Errors surfaced by the watch core and its collaborator ports.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Rejected at initialization only; nothing in the trip path
    /// re-validates the pin.
    #[error("invalid sensor pin {0}: expected -1 (disabled) or 0..=40")]
    InvalidPin(i32),

    #[error("sensor port error: {0}")]
    Sensor(String),

    #[error("printer control error: {0}")]
    Control(String),

    #[error("notification error: {0}")]
    Notify(String),

    /// The reactor task is gone and can no longer accept commands.
    #[error("trip reactor is not running")]
    ChannelClosed,
}
