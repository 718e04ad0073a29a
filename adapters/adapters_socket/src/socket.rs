//! Socket Module
//!
//! The core socket wrapper. Wraps a `socket2::Socket` in blocking mode and
//! translates OS failures into the `entities_net` error taxonomy. Typed
//! stream and datagram handles in this crate delegate here, as does the
//! handle-table dispatch in the facade layer.
//!
//! All primitive operations take `&self` (the underlying OS calls need no
//! exclusive access), so a registry can hold a socket behind `Arc` and
//! release its table lock before a blocking call.

use std::mem::MaybeUninit;
use std::net::{Shutdown, SocketAddr};
use std::os::unix::io::{AsRawFd, RawFd};

use socket2::{Domain, Protocol as RawProtocol, SockAddr, Socket as RawSocket, Type};

use adapters_poll::Pollable;
use entities_net::{AddressFamily, Protocol, SocketError, SocketType};

fn domain_of(family: AddressFamily) -> Domain {
    match family {
        AddressFamily::Ipv4 => Domain::IPV4,
        AddressFamily::Ipv6 => Domain::IPV6,
    }
}

fn type_of(socket_type: SocketType) -> Type {
    match socket_type {
        SocketType::Stream => Type::STREAM,
        SocketType::Datagram => Type::DGRAM,
    }
}

fn raw_protocol_of(protocol: Protocol) -> RawProtocol {
    match protocol {
        Protocol::Tcp => RawProtocol::TCP,
        Protocol::Udp => RawProtocol::UDP,
    }
}

/// Blocking socket wrapper
///
/// Provides a uniform interface over one endpoint of either transport kind.
/// The wrapper records the family and type it was created with so operations
/// that are undefined for a kind (`listen`/`accept` on datagram sockets,
/// addressed datagram I/O on stream sockets) fail with `NotSupported`
/// instead of reaching the driver.
#[derive(Debug)]
pub struct Socket {
    inner: RawSocket,
    family: AddressFamily,
    socket_type: SocketType,
    protocol: Protocol,
}

impl Socket {
    /// Create a new blocking socket
    ///
    /// # Arguments
    ///
    /// * `family` - Address family (IPv4 or IPv6)
    /// * `socket_type` - Socket type (Stream or Datagram)
    ///
    /// # Returns
    ///
    /// * `Ok(Socket)` - Created socket
    /// * `Err(SocketError)` - Error creating socket
    pub fn new(family: AddressFamily, socket_type: SocketType) -> Result<Self, SocketError> {
        let protocol = socket_type.protocol();
        let inner = RawSocket::new(
            domain_of(family),
            type_of(socket_type),
            Some(raw_protocol_of(protocol)),
        )?;

        Ok(Self {
            inner,
            family,
            socket_type,
            protocol,
        })
    }

    /// Bind the socket to a local address
    ///
    /// # Arguments
    ///
    /// * `addr` - Local address to reserve
    pub fn bind(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        let sock_addr = SockAddr::from(*addr);
        self.inner.bind(&sock_addr)?;
        Ok(())
    }

    /// Start listening for inbound connections (stream only)
    ///
    /// # Arguments
    ///
    /// * `backlog` - Maximum number of pending, not-yet-accepted connections
    pub fn listen(&self, backlog: i32) -> Result<(), SocketError> {
        if self.socket_type != SocketType::Stream {
            return Err(SocketError::NotSupported);
        }
        self.inner.listen(backlog)?;
        Ok(())
    }

    /// Accept an inbound connection (stream only)
    ///
    /// Blocks until a peer connects.
    ///
    /// # Returns
    ///
    /// * `Ok((Socket, SocketAddr))` - New connected socket and peer address
    /// * `Err(SocketError)` - Error accepting
    pub fn accept(&self) -> Result<(Socket, SocketAddr), SocketError> {
        if self.socket_type != SocketType::Stream {
            return Err(SocketError::NotSupported);
        }

        let (inner, addr) = self.inner.accept()?;
        let peer = addr.as_socket().ok_or(SocketError::InvalidAddress)?;

        let accepted = Socket {
            inner,
            family: self.family,
            socket_type: self.socket_type,
            protocol: self.protocol,
        };
        Ok((accepted, peer))
    }

    /// Connect to a remote address
    ///
    /// For stream sockets this blocks until the remote endpoint accepts or a
    /// transport error occurs. For datagram sockets it only records the
    /// default peer.
    ///
    /// # Arguments
    ///
    /// * `addr` - Remote address
    pub fn connect(&self, addr: &SocketAddr) -> Result<(), SocketError> {
        let sock_addr = SockAddr::from(*addr);
        self.inner.connect(&sock_addr)?;
        Ok(())
    }

    /// Send data to the connected peer
    ///
    /// # Arguments
    ///
    /// * `buf` - Data to send
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes accepted by the transport (may be fewer than
    ///   requested)
    /// * `Err(SocketError)` - Error sending
    pub fn send(&self, buf: &[u8]) -> Result<usize, SocketError> {
        let sent = self.inner.send(buf)?;
        Ok(sent)
    }

    /// Receive data from the connected peer
    ///
    /// Blocks until at least one byte arrives or the peer closes.
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to receive into
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes received; 0 means orderly peer closure
    /// * `Err(SocketError)` - Error receiving
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, SocketError> {
        let received = self.inner.recv(uninit_slice(buf))?;
        Ok(received)
    }

    /// Send a datagram to a specific address (datagram only)
    ///
    /// No prior connect is required.
    ///
    /// # Arguments
    ///
    /// * `buf` - Data to send
    /// * `addr` - Destination address
    pub fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> Result<usize, SocketError> {
        if self.socket_type != SocketType::Datagram {
            return Err(SocketError::NotSupported);
        }
        let sock_addr = SockAddr::from(*addr);
        let sent = self.inner.send_to(buf, &sock_addr)?;
        Ok(sent)
    }

    /// Receive a datagram and its sender address (datagram only)
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to receive into
    ///
    /// # Returns
    ///
    /// * `Ok((usize, SocketAddr))` - Bytes received and the sender address
    /// * `Err(SocketError)` - Error receiving
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        if self.socket_type != SocketType::Datagram {
            return Err(SocketError::NotSupported);
        }
        let (received, addr) = self.inner.recv_from(uninit_slice(buf))?;
        let sender = addr.as_socket().ok_or(SocketError::InvalidAddress)?;
        Ok((received, sender))
    }

    /// Get the local address
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        let addr = self.inner.local_addr()?;
        addr.as_socket().ok_or(SocketError::InvalidAddress)
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        let addr = self.inner.peer_addr()?;
        addr.as_socket().ok_or(SocketError::InvalidAddress)
    }

    /// Set the SO_REUSEADDR option
    pub fn set_reuse_address(&self, reuse: bool) -> Result<(), SocketError> {
        self.inner.set_reuse_address(reuse)?;
        Ok(())
    }

    /// Shut down one or both halves of the connection
    pub fn shutdown(&self, how: Shutdown) -> Result<(), SocketError> {
        self.inner.shutdown(how)?;
        Ok(())
    }

    /// Get the raw descriptor for readiness polling
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    /// Get the address family
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Get the socket type
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Get the protocol
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl Pollable for Socket {
    fn poll_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}

// socket2's receive calls take uninitialized buffers; the kernel fills the
// first n bytes it reports.
fn uninit_slice(buf: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    unsafe { std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len()) }
}
