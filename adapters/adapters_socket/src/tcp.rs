//! TCP Socket Module
//!
//! Stream transport handle. Thin typed layer over the core [`Socket`]
//! wrapper; a socket only reaches the stream operations that are defined
//! for it.

use std::net::SocketAddr;
use std::os::unix::io::RawFd;

use adapters_poll::Pollable;
use entities_net::{AddressFamily, SocketError, SocketType};

use crate::socket::Socket;

/// TCP socket handle
///
/// Follows the blocking model of the core wrapper: `connect`, `accept`, and
/// `recv` suspend the calling thread.
#[derive(Debug)]
pub struct TcpSocket {
    socket: Socket,
}

impl TcpSocket {
    /// Create a new TCP socket
    ///
    /// # Arguments
    ///
    /// * `family` - Address family (IPv4 or IPv6)
    ///
    /// # Returns
    ///
    /// * `Ok(TcpSocket)` - Created socket
    /// * `Err(SocketError)` - Error creating socket
    pub fn new(family: AddressFamily) -> Result<Self, SocketError> {
        let socket = Socket::new(family, SocketType::Stream)?;
        Ok(Self { socket })
    }

    /// Bind to a local address
    pub fn bind(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        self.socket.bind(addr)
    }

    /// Listen for inbound connections
    ///
    /// # Arguments
    ///
    /// * `backlog` - Maximum number of pending connections
    pub fn listen(&self, backlog: i32) -> Result<(), SocketError> {
        self.socket.listen(backlog)
    }

    /// Accept an inbound connection
    ///
    /// Blocks until a peer connects.
    ///
    /// # Returns
    ///
    /// * `Ok((TcpSocket, SocketAddr))` - New connected handle and peer address
    /// * `Err(SocketError)` - Error accepting
    pub fn accept(&self) -> Result<(TcpSocket, SocketAddr), SocketError> {
        let (socket, peer) = self.socket.accept()?;
        Ok((TcpSocket { socket }, peer))
    }

    /// Connect to a remote address
    ///
    /// Blocks until the remote endpoint accepts or a transport error occurs.
    pub fn connect(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        self.socket.connect(addr)
    }

    /// Send data to the connected peer
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes accepted by the transport
    pub fn send(&self, buf: &[u8]) -> Result<usize, SocketError> {
        self.socket.send(buf)
    }

    /// Receive data from the connected peer
    ///
    /// Blocks until at least one byte arrives; 0 means the peer closed.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, SocketError> {
        self.socket.recv(buf)
    }

    /// Get the local address
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.socket.local_addr()
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        self.socket.peer_addr()
    }

    /// Set the SO_REUSEADDR option
    pub fn set_reuse_address(&self, reuse: bool) -> Result<(), SocketError> {
        self.socket.set_reuse_address(reuse)
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

impl Pollable for TcpSocket {
    fn poll_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::thread;

    fn ephemeral() -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
    }

    #[test]
    fn test_tcp_socket_creation() {
        assert!(TcpSocket::new(AddressFamily::Ipv4).is_ok());
        assert!(TcpSocket::new(AddressFamily::Ipv6).is_ok());
    }

    #[test]
    fn test_tcp_bind_listen() {
        let socket = TcpSocket::new(AddressFamily::Ipv4).unwrap();
        socket.bind(&ephemeral()).unwrap();
        assert!(socket.listen(5).is_ok());

        let bound = socket.local_addr().unwrap();
        assert!(bound.port() > 0);
    }

    #[test]
    fn test_tcp_client_server_round_trip() {
        let listener = TcpSocket::new(AddressFamily::Ipv4).unwrap();
        listener.bind(&ephemeral()).unwrap();
        listener.listen(5).unwrap();
        let addr = listener.local_addr().unwrap();

        let client_thread = thread::spawn(move || {
            let client = TcpSocket::new(AddressFamily::Ipv4).unwrap();
            client.connect(&addr).unwrap();
            assert_eq!(client.send(b"foo").unwrap(), 3);

            let mut buf = [0u8; 8];
            let received = client.recv(&mut buf).unwrap();
            assert_eq!(&buf[..received], b"bar");
        });

        let (server, peer) = listener.accept().unwrap();
        assert_eq!(peer.ip(), Ipv4Addr::LOCALHOST);

        let mut buf = [0u8; 8];
        let received = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..received], b"foo");
        server.send(b"bar").unwrap();

        client_thread.join().unwrap();
    }

    #[test]
    fn test_tcp_accept_keeps_listener_usable() {
        let listener = TcpSocket::new(AddressFamily::Ipv4).unwrap();
        listener.bind(&ephemeral()).unwrap();
        listener.listen(5).unwrap();
        let addr = listener.local_addr().unwrap();

        let clients = thread::spawn(move || {
            for _ in 0..2 {
                let client = TcpSocket::new(AddressFamily::Ipv4).unwrap();
                client.connect(&addr).unwrap();
            }
        });

        let (first, _) = listener.accept().unwrap();
        let (second, _) = listener.accept().unwrap();
        assert_ne!(first.as_raw_fd(), second.as_raw_fd());
        assert_ne!(first.as_raw_fd(), listener.as_raw_fd());

        clients.join().unwrap();
    }

    #[test]
    fn test_tcp_peer_addr_not_connected() {
        let socket = TcpSocket::new(AddressFamily::Ipv4).unwrap();
        assert!(socket.peer_addr().is_err());
    }

    #[test]
    fn test_tcp_poll_fd() {
        let socket = TcpSocket::new(AddressFamily::Ipv4).unwrap();
        assert_eq!(socket.poll_fd(), socket.as_raw_fd());
    }
}
