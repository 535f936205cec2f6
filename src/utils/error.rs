//! Error types for MBMP
//!
//! Errors only cross module boundaries at construction time (building the
//! engine, loading settings). Once the pipeline is running, control and
//! query failures are turned into notifications instead of being returned.

use thiserror::Error;

/// Main error type for MBMP
#[derive(Error, Debug)]
pub enum MbmpError {
    /// Media engine errors (element creation, state changes, seeks)
    #[error("Engine error: {0}")]
    Engine(String),

    /// Settings errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Serialization errors for notification output
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Malformed interactive commands
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(feature = "gst")]
impl From<gstreamer::glib::BoolError> for MbmpError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        MbmpError::Engine(format!("GStreamer error: {}", err))
    }
}

#[cfg(feature = "gst")]
impl From<gstreamer::glib::Error> for MbmpError {
    fn from(err: gstreamer::glib::Error) -> Self {
        MbmpError::Engine(format!("GStreamer initialization failed: {}", err))
    }
}

#[cfg(feature = "gst")]
impl From<gstreamer::StateChangeError> for MbmpError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        MbmpError::Engine(format!("State change failed: {}", err))
    }
}

impl MbmpError {
    /// Create an engine error from string
    pub fn engine_error<S: Into<String>>(msg: S) -> Self {
        MbmpError::Engine(msg.into())
    }
}

/// Convenience type alias for Results in MBMP
pub type Result<T> = std::result::Result<T, MbmpError>;

/// Extension trait for converting other errors to MbmpError
pub trait IntoPlayerError<T> {
    /// Convert this error into an engine error with the given context
    fn engine_err(self, context: &str) -> Result<T>;
    /// Convert this error into a configuration error with the given context
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn engine_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MbmpError::Engine(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MbmpError::Config(format!("{}: {}", context, e)))
    }
}
