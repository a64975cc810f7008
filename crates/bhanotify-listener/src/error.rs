/// Errors that can occur while running a notification listener.
///
/// Per-frame failures are not errors; they are reported as
/// [`crate::FrameOutcome`] values. Everything here stops a listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] bhanotify_transport::TransportError),

    /// Frame-level error (key material, encoding).
    #[error("frame error: {0}")]
    Frame(#[from] bhanotify_frame::FrameError),

    /// The configured key is not valid base64.
    #[error("invalid key encoding: {0}")]
    KeyEncoding(#[from] base64::DecodeError),

    /// The external key provider could not produce a key.
    #[error("key provisioning failed: {0}")]
    KeyProvisioning(String),

    /// The event consumer went away.
    #[error("event sink closed")]
    SinkClosed,

    /// A listener thread panicked.
    #[error("listener for port {0} panicked")]
    ThreadPanicked(u16),
}

pub type Result<T> = std::result::Result<T, ListenerError>;
