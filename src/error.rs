//! Error types for the systems driver layer.

use thiserror::Error;

/// Failure raised by a hypervisor host API.
///
/// The host management surface is an opaque collaborator; all we assume is
/// that it fails with a message. Backends wrap these into
/// [`DriverError::Backend`] with the operation and system identity attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors that can occur during driver operations.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The backend has no concept of the requested capability
    /// (BIOS attributes, boot images, unmapped power transitions).
    /// Terminal and not retryable; the front-end surfaces it as a
    /// "not supported" response.
    #[error("not supported by backend: {0}")]
    NotSupported(String),

    /// A requested value has no mapping or entry for the system's
    /// hardware generation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A backend API call failed. Carries the operation and identity so
    /// the caller can log or retry at a higher layer; nothing is retried
    /// here.
    #[error("failed to {op} for system \"{identity}\": {source}")]
    Backend {
        op: String,
        identity: String,
        #[source]
        source: HostError,
    },
}

impl DriverError {
    /// Wrap a host failure with operation and identity context.
    pub fn backend(op: impl Into<String>, identity: impl Into<String>, source: HostError) -> Self {
        Self::Backend {
            op: op.into(),
            identity: identity.into(),
            source,
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
