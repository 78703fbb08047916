//! Consumer-visible failure type.
//!
//! A worker never recovers a failure internally: any error or panic that
//! escapes a stream step becomes a terminal event, tears its region down,
//! and resurfaces from the consumer's pull as a [`Fault`]. By the time a
//! pull returns `Err`, every worker of the failed region has been joined.

use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// Payload from a caught worker panic.
///
/// Wraps the panic message for transport across thread boundaries.
#[derive(Debug, Clone)]
pub struct PanicPayload {
    message: String,
}

impl PanicPayload {
    /// Creates a new panic payload with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts a payload from the value carried by [`std::panic::catch_unwind`].
    pub(crate) fn from_unwind(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "opaque panic payload".to_owned());
        Self::new(message)
    }

    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.message)
    }
}

/// A failure raised by a stream step.
#[derive(Debug, Clone)]
pub enum Fault {
    /// An application-level error raised by a fallible step.
    Error(Arc<dyn std::error::Error + Send + Sync>),
    /// A worker panicked while running a step.
    Panicked(PanicPayload),
}

impl Fault {
    /// Wraps an application error.
    #[must_use]
    pub fn error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Error(Arc::new(err))
    }

    /// Creates a fault from a bare message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Error(Arc::new(MessageError(message.into())))
    }

    /// Returns true if this fault is a captured panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "{err}"),
            Self::Panicked(payload) => write!(f, "{payload}"),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Error(err) => Some(err.as_ref() as _),
            Self::Panicked(_) => None,
        }
    }
}

/// Error type backing [`Fault::message`].
#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn message_fault_displays_bare_text() {
        let fault = Fault::message("queue underflow");
        assert_eq!(fault.to_string(), "queue underflow");
        assert!(!fault.is_panic());
    }

    #[test]
    fn panic_payload_from_str_literal() {
        let caught = catch_unwind(AssertUnwindSafe(|| panic!("boom"))).unwrap_err();
        let payload = PanicPayload::from_unwind(caught.as_ref());
        assert_eq!(payload.message(), "boom");
        assert_eq!(payload.to_string(), "panic: boom");
    }

    #[test]
    fn panic_payload_from_formatted_string() {
        let caught = catch_unwind(AssertUnwindSafe(|| panic!("value {}", 42))).unwrap_err();
        let payload = PanicPayload::from_unwind(caught.as_ref());
        assert_eq!(payload.message(), "value 42");
    }

    #[test]
    fn fault_preserves_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let fault = Fault::error(io);
        assert!(std::error::Error::source(&fault).is_some());
        assert_eq!(fault.to_string(), "disk gone");
    }
}
