//! UDP Socket Module
//!
//! Datagram transport handle. A datagram socket has no connection phase:
//! addressed `send_to`/`recv_from` work directly against the provided
//! addresses. `connect` merely records a default peer for the plain
//! `send`/`recv` convenience calls.

use std::net::SocketAddr;
use std::os::unix::io::RawFd;

use adapters_poll::Pollable;
use entities_net::{AddressFamily, SocketError, SocketType};

use crate::socket::Socket;

/// UDP socket handle
#[derive(Debug)]
pub struct UdpSocket {
    socket: Socket,
}

impl UdpSocket {
    /// Create a new UDP socket
    ///
    /// # Arguments
    ///
    /// * `family` - Address family (IPv4 or IPv6)
    ///
    /// # Returns
    ///
    /// * `Ok(UdpSocket)` - Created socket
    /// * `Err(SocketError)` - Error creating socket
    pub fn new(family: AddressFamily) -> Result<Self, SocketError> {
        let socket = Socket::new(family, SocketType::Datagram)?;
        Ok(Self { socket })
    }

    /// Bind to a local address
    pub fn bind(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        self.socket.bind(addr)
    }

    /// Send a datagram to a specific address
    ///
    /// No prior connect is required.
    ///
    /// # Arguments
    ///
    /// * `buf` - Data to send
    /// * `addr` - Destination address
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes accepted by the transport
    pub fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> Result<usize, SocketError> {
        self.socket.send_to(buf, addr)
    }

    /// Receive a datagram and its sender address
    ///
    /// Blocks until a datagram arrives.
    ///
    /// # Returns
    ///
    /// * `Ok((usize, SocketAddr))` - Bytes received and the sender address
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        self.socket.recv_from(buf)
    }

    /// Record a default peer for `send`/`recv`
    pub fn connect(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        self.socket.connect(addr)
    }

    /// Send to the default peer
    pub fn send(&self, buf: &[u8]) -> Result<usize, SocketError> {
        self.socket.send(buf)
    }

    /// Receive from the default peer
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, SocketError> {
        self.socket.recv(buf)
    }

    /// Get the local address
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.socket.local_addr()
    }

    /// Get the default peer address
    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        self.socket.peer_addr()
    }

    /// Get the raw descriptor for readiness polling
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }

    /// Get the underlying socket
    pub fn inner(&self) -> &Socket {
        &self.socket
    }
}

impl Pollable for UdpSocket {
    fn poll_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ephemeral() -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
    }

    #[test]
    fn test_udp_socket_creation() {
        assert!(UdpSocket::new(AddressFamily::Ipv4).is_ok());
        assert!(UdpSocket::new(AddressFamily::Ipv6).is_ok());
    }

    #[test]
    fn test_udp_bind() {
        let socket = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        socket.bind(&ephemeral()).unwrap();

        let bound = socket.local_addr().unwrap();
        assert_eq!(bound.ip(), Ipv4Addr::LOCALHOST);
        assert!(bound.port() > 0);
    }

    #[test]
    fn test_udp_send_to_without_connect() {
        let receiver = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        receiver.bind(&ephemeral()).unwrap();
        let addr = receiver.local_addr().unwrap();

        let sender = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        assert_eq!(sender.send_to(b"hello", &addr).unwrap(), 5);

        let mut buf = [0u8; 32];
        let (received, from) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..received], b"hello");
        assert_eq!(from.ip(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_udp_connected_send_recv() {
        let a = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        a.bind(&ephemeral()).unwrap();
        let b = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        b.bind(&ephemeral()).unwrap();

        a.connect(&b.local_addr().unwrap()).unwrap();
        b.connect(&a.local_addr().unwrap()).unwrap();

        assert_eq!(a.send(b"ping").unwrap(), 4);
        let mut buf = [0u8; 8];
        assert_eq!(b.recv(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"ping");
    }

    #[test]
    fn test_udp_reply_to_sender() {
        let server = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        server.bind(&ephemeral()).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        client.bind(&ephemeral()).unwrap();
        client.send_to(b"query", &server_addr).unwrap();

        let mut buf = [0u8; 32];
        let (received, from) = server.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..received], b"query");

        server.send_to(b"reply", &from).unwrap();
        let (received, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..received], b"reply");
    }

    #[test]
    fn test_udp_poll_fd() {
        let socket = UdpSocket::new(AddressFamily::Ipv4).unwrap();
        assert_eq!(socket.poll_fd(), socket.as_raw_fd());
    }
}
