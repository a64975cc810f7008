use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{DatagramSource, RawFrame};

/// A bound UDP port receiving broadcast notifications.
///
/// Broadcast reception is enabled on bind. Each listener owns exactly one
/// socket; services listening on several ports bind one listener per port.
pub struct UdpListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buffer: usize,
}

impl UdpListener {
    /// Receive buffer size. Notification datagrams are well under 100 bytes;
    /// anything larger than this is truncated by the kernel.
    pub const DEFAULT_RECV_BUFFER: usize = 2048;

    /// Default read timeout used so receive loops can observe shutdown.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

    /// Bind a UDP socket on `addr` with broadcast reception enabled.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        socket
            .set_broadcast(true)
            .map_err(|e| TransportError::Bind { addr, source: e })?;
        socket
            .set_read_timeout(Some(Self::DEFAULT_READ_TIMEOUT))
            .map_err(|e| TransportError::Bind { addr, source: e })?;
        let local_addr = socket.local_addr()?;

        info!(%local_addr, "listening for UDP broadcasts");

        Ok(Self {
            socket,
            local_addr,
            recv_buffer: Self::DEFAULT_RECV_BUFFER,
        })
    }

    /// Override how long a single `recv` blocks before returning `Ok(None)`.
    ///
    /// `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Bound port.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }
}

impl DatagramSource for UdpListener {
    fn recv(&mut self) -> Result<Option<RawFrame>> {
        let mut buf = vec![0u8; self.recv_buffer];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, source)) => {
                    let received_at = Instant::now();
                    buf.truncate(n);
                    debug!(port = self.local_addr.port(), %source, len = n, "received datagram");
                    return Ok(Some(RawFrame::new(Bytes::from(buf), source, received_at)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl std::fmt::Debug for UdpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpListener")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

/// Send a single datagram to `target` from an ephemeral port.
///
/// Broadcast is enabled on the sending socket so `target` may be a
/// broadcast address.
pub fn send_datagram(target: SocketAddr, payload: &[u8]) -> Result<usize> {
    let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    let socket = UdpSocket::bind(local).map_err(|e| TransportError::Bind {
        addr: local,
        source: e,
    })?;
    socket.set_broadcast(true)?;
    let sent = socket
        .send_to(payload, target)
        .map_err(|e| TransportError::Send {
            addr: target,
            source: e,
        })?;
    debug!(%target, len = sent, "sent datagram");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_any_port() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
    }

    #[test]
    fn test_bind_and_receive() {
        let mut listener = UdpListener::bind(loopback_any_port()).unwrap();
        let target = listener.local_addr();

        let sent = send_datagram(target, b"hello").unwrap();
        assert_eq!(sent, 5);

        listener.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let frame = listener.recv().unwrap().expect("datagram should arrive");
        assert_eq!(frame.payload.as_ref(), b"hello");
        assert_eq!(frame.len(), 5);
        assert_eq!(frame.source.ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_read_timeout_returns_none() {
        let mut listener = UdpListener::bind(loopback_any_port()).unwrap();
        listener
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        assert!(listener.recv().unwrap().is_none());
    }

    #[test]
    fn test_bind_conflict_is_bind_error() {
        let first = UdpListener::bind(loopback_any_port()).unwrap();
        let result = UdpListener::bind(first.local_addr());
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_datagrams_arrive_in_order() {
        let mut listener = UdpListener::bind(loopback_any_port()).unwrap();
        listener.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let target = listener.local_addr();

        for i in 0..8u8 {
            send_datagram(target, &[i]).unwrap();
        }
        for i in 0..8u8 {
            let frame = listener.recv().unwrap().expect("datagram should arrive");
            assert_eq!(frame.payload.as_ref(), &[i]);
        }
    }

    #[test]
    fn test_port_and_debug() {
        let listener = UdpListener::bind(loopback_any_port()).unwrap();
        assert_ne!(listener.port(), 0);
        assert!(format!("{listener:?}").contains("UdpListener"));
    }
}
