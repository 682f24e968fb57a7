//! Rendering error types.

use std::fmt;

/// Errors that can occur in the rendering system.
///
/// The taxonomy is deliberately small:
///
/// - [`Configuration`](Self::Configuration) - invalid resource parameters,
///   raised synchronously at creation time, never during a frame.
/// - [`Lookup`](Self::Lookup) - a name that is not registered with the
///   device, raised synchronously with no mutation performed.
/// - [`Backend`](Self::Backend) - reported by the backend, either from the
///   aggregated end-of-frame check or while reconstructing resources after
///   a context restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// An invalid parameter was provided when creating a resource.
    Configuration(String),
    /// A requested object is not registered with the device.
    Lookup(String),
    /// The backend reported an error.
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Lookup(msg) => write!(f, "lookup failed: {msg}"),
            Self::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
