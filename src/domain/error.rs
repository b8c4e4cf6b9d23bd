//! Error types for the flightdeck client.
//!
//! This module defines the centralized error type [`FlightdeckError`] and a type
//! alias [`Result`] for convenient error handling throughout the crate. All errors
//! are implemented using the `thiserror` crate for automatic `Error` trait
//! implementation.
//!
//! Runtime faults that the session absorbs (dropped connections, malformed
//! frames, stale responses) are logged and folded into view state rather than
//! returned. The variants here cover what a caller can actually act on.

use thiserror::Error;

/// The main error type for flightdeck operations.
///
/// # Examples
///
/// ```
/// use flightdeck::domain::FlightdeckError;
///
/// fn validate_page_size(size: usize) -> Result<(), FlightdeckError> {
///     if size == 0 {
///         return Err(FlightdeckError::InvalidInput("page size must be positive".into()));
///     }
///     Ok(())
/// }
///
/// assert!(validate_page_size(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum FlightdeckError {
    /// Preferences storage operation failed.
    ///
    /// Occurs when reading from or writing to the preferences backend fails.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding a JSON payload failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport rejected an operation (send on a dead socket, connect
    /// failure reported synchronously).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A display-boundary call carried a value the session cannot act on,
    /// such as a zero page size or an unknown sort field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session has been torn down and accepts no further events.
    #[error("Session closed")]
    SessionClosed,
}

/// A specialized `Result` type for flightdeck operations.
pub type Result<T> = std::result::Result<T, FlightdeckError>;
