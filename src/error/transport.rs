//! Transport error module.
//!
//! Errors that can occur in the Unix-domain-socket transport: binding,
//! locking, accepting, and the bounded read loop. Grounded in the
//! `InternalError` enum shared by the original implementation's
//! `BaseCommInterface`/`BaseTransportInterface`.

use std::io;
use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to bind the listening socket.
    #[error("Failed to bind socket at {path}: {source}")]
    Bind {
        /// The socket path that failed to bind.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Another instance already holds the exclusive lock file.
    #[error("Lock file {0} is held by another instance")]
    LockHeld(String),

    /// Underlying IO error not otherwise classified.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The transient-error retry budget for one operation was exhausted.
    #[error("Maximum retries on transient errors exceeded during {0}")]
    MaxRetriesExceeded(&'static str),

    /// `poll` returned an error that was not itself transient.
    #[error("Poll error: {0}")]
    PollError(String),

    /// A read returned zero bytes while the accumulator was still empty.
    #[error("Partial read: no more data, but nothing usable was accumulated")]
    PartialRead,

    /// The accumulator reached its configured capacity before a complete
    /// message could be parsed.
    #[error("Accumulator buffer is full")]
    FullBuffer,

    /// An operation was attempted on a transport that is not running.
    #[error("Transport is not running")]
    NotRunning,

    /// The transport is already running.
    #[error("Transport is already running")]
    AlreadyRunning,

    /// A connect/send/read attempt to a remote peer timed out.
    #[error("Transport timeout after {0} milliseconds")]
    Timeout(u64),

    /// Other transport errors.
    #[error("Transport error: {0}")]
    Other(String),
}
