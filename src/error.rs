//! Error classification for retry decisions.
//!
//! Retryability is decided on a closed set of [`ErrorKind`] tags rather than
//! on concrete error types. An operation's error type opts in by implementing
//! [`ClassifyError`], and a policy is configured with the subset of kinds it
//! considers transient. Everything outside that subset is treated as a real
//! bug and surfaces on first occurrence.

use std::fmt;

use thiserror::Error;

/// Classification of an operation failure, by retry disposition.
///
/// The set is deliberately closed: a policy's retry decision is a membership
/// test over these tags, which keeps the retryable/fatal split explicit and
/// exhaustively testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection-level failure (refused, reset, dropped mid-flight).
    Connection,
    /// The operation did not complete in time.
    Timeout,
    /// The remote side asked us to slow down.
    RateLimit,
    /// Other I/O failure.
    Io,
    /// Malformed or rejected input or response data.
    Validation,
    /// A broken invariant in the caller's own logic. Never worth retrying.
    Logic,
    /// Anything that fits none of the above.
    Other,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Connection,
        ErrorKind::Timeout,
        ErrorKind::RateLimit,
        ErrorKind::Io,
        ErrorKind::Validation,
        ErrorKind::Logic,
        ErrorKind::Other,
    ];

    /// The kinds that usually denote transient infrastructure trouble.
    ///
    /// This is the recommended retryable set for network-facing operations:
    /// connection failures, timeouts, and rate limiting tend to clear up on
    /// their own, while the remaining kinds point at problems a retry cannot
    /// fix.
    pub const TRANSIENT: [ErrorKind; 3] =
        [ErrorKind::Connection, ErrorKind::Timeout, ErrorKind::RateLimit];
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate-limit",
            Self::Io => "io",
            Self::Validation => "validation",
            Self::Logic => "logic",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// An error that knows its own [`ErrorKind`].
///
/// Implement this for your operation's error type so a
/// [`RetryPolicy`](crate::retry::RetryPolicy) can decide whether a failure is
/// worth retrying. The classification must be stable: the same error value
/// always maps to the same kind.
pub trait ClassifyError: std::error::Error {
    /// The kind this error falls under.
    fn classify(&self) -> ErrorKind;
}

/// `std::io::Error` classifies by its own `io::ErrorKind`.
///
/// Connection-shaped failures map to [`ErrorKind::Connection`], timeouts to
/// [`ErrorKind::Timeout`], input problems to [`ErrorKind::Validation`], and
/// the rest to [`ErrorKind::Io`].
impl ClassifyError for std::io::Error {
    fn classify(&self) -> ErrorKind {
        use std::io::ErrorKind as Io;
        match std::io::Error::kind(self) {
            Io::ConnectionRefused
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::NotConnected
            | Io::BrokenPipe => ErrorKind::Connection,
            Io::TimedOut | Io::WouldBlock => ErrorKind::Timeout,
            Io::InvalidInput | Io::InvalidData => ErrorKind::Validation,
            _ => ErrorKind::Io,
        }
    }
}

/// A minimal classified error for callers without an error type of their own.
///
/// Useful in demos, tests, and quick scripts where defining a dedicated error
/// enum is not worth the ceremony:
///
/// ```rust
/// use retrykit::error::{ClassifyError, ErrorKind, TaggedError};
///
/// let err = TaggedError::timeout("no response within 5s");
/// assert_eq!(err.classify(), ErrorKind::Timeout);
/// assert_eq!(err.to_string(), "timeout error: no response within 5s");
/// ```
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct TaggedError {
    kind: ErrorKind,
    message: String,
}

impl TaggedError {
    /// Create an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A [`ErrorKind::Connection`] error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// A [`ErrorKind::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// A [`ErrorKind::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// A [`ErrorKind::Logic`] error.
    pub fn logic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logic, message)
    }

    /// The kind this error was tagged with.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ClassifyError for TaggedError {
    fn classify(&self) -> ErrorKind {
        self.kind
    }
}
