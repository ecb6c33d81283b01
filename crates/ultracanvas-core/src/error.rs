//! Error types for UltraCanvas core services.

use std::fmt;

/// The main error type for UltraCanvas core operations.
#[derive(Debug)]
pub enum CoreError {
    /// Application has already been initialized.
    ApplicationAlreadyInitialized,
    /// Application has not been initialized yet.
    ApplicationNotInitialized,
    /// The platform layer refused to start (no display, no event loop).
    Platform(String),
    /// Failed to create a window.
    WindowCreation(String),
    /// The window ID does not name a live window.
    UnknownWindow,
    /// Timer-related error.
    Timer(TimerError),
    /// Signal-related error.
    Signal(SignalError),
    /// The UI task queue has been closed.
    TaskQueueClosed,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplicationAlreadyInitialized => {
                write!(f, "Application has already been initialized")
            }
            Self::ApplicationNotInitialized => {
                write!(f, "Application has not been initialized. Call Application::initialize() first")
            }
            Self::Platform(msg) => write!(f, "Platform initialization failed: {msg}"),
            Self::WindowCreation(msg) => write!(f, "Failed to create window: {msg}"),
            Self::UnknownWindow => write!(f, "Window does not exist or was deleted"),
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::Signal(err) => write!(f, "Signal error: {err}"),
            Self::TaskQueueClosed => write!(f, "The UI task queue has been closed"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            Self::Signal(err) => Some(err),
            _ => None,
        }
    }
}

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid or has already been removed.
    InvalidTimerId,
    /// A repeating timer was requested with a zero interval.
    ZeroInterval,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
            Self::ZeroInterval => write!(f, "Repeating timers need a non-zero interval"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for CoreError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    InvalidConnection,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid or disconnected connection ID"),
        }
    }
}

impl std::error::Error for SignalError {}

impl From<SignalError> for CoreError {
    fn from(err: SignalError) -> Self {
        Self::Signal(err)
    }
}

/// A specialized Result type for UltraCanvas core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CoreError::ApplicationAlreadyInitialized.to_string(),
            "Application has already been initialized"
        );
        assert_eq!(
            CoreError::Platform("no display".into()).to_string(),
            "Platform initialization failed: no display"
        );
    }

    #[test]
    fn test_source_chain() {
        let err: CoreError = TimerError::InvalidTimerId.into();
        assert!(err.source().is_some());
        assert!(CoreError::UnknownWindow.source().is_none());
    }
}
