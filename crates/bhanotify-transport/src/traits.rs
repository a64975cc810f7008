use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;

use crate::error::Result;

/// One received datagram, exactly as it came off the wire.
///
/// A `RawFrame` is created per datagram by a [`DatagramSource`] and consumed
/// once by the decode pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// The full datagram payload.
    pub payload: Bytes,
    /// Address of the sender.
    pub source: SocketAddr,
    /// Monotonic instant at which the datagram was received.
    pub received_at: Instant,
}

impl RawFrame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>, source: SocketAddr, received_at: Instant) -> Self {
        Self {
            payload: payload.into(),
            source,
            received_at,
        }
    }

    /// Datagram length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the datagram carried no bytes.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Anything that yields datagrams one at a time, in receipt order.
///
/// Implemented by [`crate::UdpListener`]; tests substitute scripted sources.
pub trait DatagramSource {
    /// Receive the next datagram.
    ///
    /// Returns `Ok(None)` when the read timeout elapsed without traffic, so
    /// the caller can check for shutdown and call again.
    fn recv(&mut self) -> Result<Option<RawFrame>>;

    /// Local address this source is bound to.
    fn local_addr(&self) -> SocketAddr;
}
