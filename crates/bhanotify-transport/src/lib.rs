//! UDP datagram transport for intercom broadcast notifications.
//!
//! This is the lowest layer of bhanotify. It binds notification ports and
//! hands every received datagram upward as a [`RawFrame`]: the bytes, the
//! sender, and the instant of receipt. Nothing here looks inside a datagram.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::{DatagramSource, RawFrame};
pub use udp::{send_datagram, UdpListener};
