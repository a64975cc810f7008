//! Receive, authenticate, and classify intercom broadcast notifications.
//!
//! Doorbell and intercom devices announce motion and doorbell presses as
//! encrypted UDP broadcasts. bhanotify validates those datagrams, drops
//! retransmitted copies, decrypts the ones sealed for this receiver, and
//! classifies the event.
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP binding and datagram receive
//! - [`frame`]: Header validation, ChaCha20-Poly1305, event records
//! - [`listener`]: Per-port pipeline, duplicate suppression, event sinks

/// Re-export transport types.
pub mod transport {
    pub use bhanotify_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bhanotify_frame::*;
}

/// Re-export listener types.
pub mod listener {
    pub use bhanotify_listener::*;
}
