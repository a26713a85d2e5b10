//! Unified error type for btn2net.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Every fallible facade operation returns one of these to its immediate
//! caller; nothing is escalated further than one call level.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Lifecycle
    /// Capture, signal, or worker initialization failed.
    Init,

    /// A resource could not be released during de-initialization.
    Teardown,

    /// An operation was invoked before `init`.
    NotInitialized,

    // Connectivity
    /// The wireless link driver could not be brought up.
    LinkUp,

    /// The link never reached `Connected` within the bounded retry loop.
    LinkUpTimeout,

    /// The connectivity accessor could not confirm `Connected` within
    /// its bound, or the link was down when a send was requested.
    SendTimeout,

    // Queue
    /// The command queue stayed full for the whole enqueue wait.
    QueueFull,

    // Network
    /// A per-command network transaction failed.
    Transport(TransportError),
}

/// Failures inside a single connect-send-close transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The link has no default gateway address yet.
    NoGateway,
    /// Opening the per-command connection failed.
    ConnectFailed,
    /// Writing the command record failed.
    WriteFailed,
}

// Convenience conversions

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}
