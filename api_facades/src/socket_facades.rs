//! Socket Facades
//!
//! The handle table and dispatch for socket operations. Every socket created
//! through this facade lives in a global registry keyed by an opaque
//! monotonically increasing handle. Operations look the handle up, enforce
//! the lifecycle state machine for the entry's socket type, and delegate to
//! the blocking socket wrapper.
//!
//! Released handles stay in the table marked `Closed` so later operations on
//! them fail with `Closed`; a handle value that was never issued fails with
//! `InvalidArgument`. The table lock is never held across a blocking call:
//! `connect`, `accept`, and the receive operations clone the entry's
//! `Arc<Socket>` and release the lock before suspending, so a blocked call
//! cannot wedge unrelated handles.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use lazy_static::lazy_static;

use adapters_socket::Socket;
use entities_net::{AddressFamily, SocketError, SocketState, SocketType};

/// Opaque reference to one socket endpoint in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(u64);

impl SocketHandle {
    /// Get the numeric id
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct SocketEntry {
    // None once the handle has been closed.
    socket: Option<Arc<Socket>>,
    family: AddressFamily,
    socket_type: SocketType,
    state: SocketState,
}

struct SocketRegistry {
    entries: HashMap<u64, SocketEntry>,
    next_id: u64,
}

impl SocketRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, entry: SocketEntry) -> SocketHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, entry);
        SocketHandle(id)
    }

    fn entry(&self, handle: SocketHandle) -> Result<&SocketEntry, SocketError> {
        self.entries
            .get(&handle.0)
            .ok_or(SocketError::InvalidArgument)
    }

    fn entry_mut(&mut self, handle: SocketHandle) -> Result<&mut SocketEntry, SocketError> {
        self.entries
            .get_mut(&handle.0)
            .ok_or(SocketError::InvalidArgument)
    }

    // Socket of an open entry, for cloning out before a blocking call.
    fn open_socket(&self, handle: SocketHandle) -> Result<Arc<Socket>, SocketError> {
        let entry = self.entry(handle)?;
        entry.socket.clone().ok_or(SocketError::Closed)
    }
}

lazy_static! {
    static ref SOCKET_REGISTRY: Mutex<SocketRegistry> = Mutex::new(SocketRegistry::new());
}

fn registry() -> MutexGuard<'static, SocketRegistry> {
    SOCKET_REGISTRY.lock().unwrap()
}

/// Create a socket from raw family and type codes
///
/// # Arguments
///
/// * `family_code` - Raw address family code (`AF_INET`, `AF_INET6`)
/// * `type_code` - Raw socket type code (`SOCK_STREAM`, `SOCK_DGRAM`)
///
/// # Returns
///
/// * `Ok(SocketHandle)` - New handle in the `Created` state
/// * `Err(SocketError::InvalidArgument)` - Unrecognized family or type code
pub fn socket_create(family_code: i32, type_code: i32) -> Result<SocketHandle, SocketError> {
    let family = AddressFamily::from_code(family_code)?;
    let socket_type = SocketType::from_code(type_code)?;
    let socket = Socket::new(family, socket_type)?;

    let mut registry = registry();
    Ok(registry.insert(SocketEntry {
        socket: Some(Arc::new(socket)),
        family,
        socket_type,
        state: SocketState::Created,
    }))
}

/// Reserve a local address for the handle
///
/// Transitions `Created -> Bound`.
pub fn socket_bind(handle: SocketHandle, addr: &SocketAddr) -> Result<(), SocketError> {
    let mut registry = registry();
    let entry = registry.entry_mut(handle)?;
    let socket = entry.socket.as_ref().ok_or(SocketError::Closed)?;

    if !entry
        .state
        .may_transition(SocketState::Bound, entry.socket_type)
    {
        return Err(SocketError::InvalidState);
    }

    socket.bind(addr)?;
    entry.state = SocketState::Bound;
    Ok(())
}

/// Start listening for inbound connections (stream only)
///
/// Transitions `Bound -> Listening`.
///
/// # Arguments
///
/// * `handle` - Listening candidate
/// * `backlog` - Maximum number of pending connections to queue
pub fn socket_listen(handle: SocketHandle, backlog: i32) -> Result<(), SocketError> {
    let mut registry = registry();
    let entry = registry.entry_mut(handle)?;
    let socket = entry.socket.as_ref().ok_or(SocketError::Closed)?;

    if entry.socket_type != SocketType::Stream {
        return Err(SocketError::NotSupported);
    }
    if !entry
        .state
        .may_transition(SocketState::Listening, entry.socket_type)
    {
        return Err(SocketError::InvalidState);
    }

    socket.listen(backlog)?;
    entry.state = SocketState::Listening;
    Ok(())
}

/// Connect the handle to a remote endpoint (stream only)
///
/// Blocks until the remote endpoint accepts or a transport error occurs.
/// Transitions `Created -> Connecting -> Connected`; a failed attempt
/// returns the handle to `Created`.
pub fn socket_connect(handle: SocketHandle, addr: &SocketAddr) -> Result<(), SocketError> {
    let socket = {
        let mut registry = registry();
        let entry = registry.entry_mut(handle)?;
        let socket = entry.socket.clone().ok_or(SocketError::Closed)?;

        if entry.socket_type != SocketType::Stream {
            return Err(SocketError::NotSupported);
        }
        if !entry
            .state
            .may_transition(SocketState::Connecting, entry.socket_type)
        {
            return Err(SocketError::InvalidState);
        }

        entry.state = SocketState::Connecting;
        socket
    };

    let result = socket.connect(addr);

    let mut registry = registry();
    let entry = registry.entry_mut(handle)?;
    // The handle may have been closed while the connect was in flight; in
    // that case its state stays Closed.
    if entry.state == SocketState::Connecting {
        entry.state = match result {
            Ok(()) => SocketState::Connected,
            Err(_) => SocketState::Created,
        };
    }
    result
}

/// Accept an inbound connection (listening handles only)
///
/// Blocks until a peer connects. The listening handle keeps its `Listening`
/// state; the returned handle is a new, distinct `Connected` entry.
///
/// # Returns
///
/// * `Ok((SocketHandle, SocketAddr))` - New connected handle and peer address
pub fn socket_accept(handle: SocketHandle) -> Result<(SocketHandle, SocketAddr), SocketError> {
    let (socket, family) = {
        let registry = registry();
        let entry = registry.entry(handle)?;
        let socket = entry.socket.clone().ok_or(SocketError::Closed)?;

        if entry.socket_type != SocketType::Stream {
            return Err(SocketError::NotSupported);
        }
        if entry.state != SocketState::Listening {
            return Err(SocketError::InvalidState);
        }

        (socket, entry.family)
    };

    let (accepted, peer) = socket.accept()?;

    let mut registry = registry();
    let new_handle = registry.insert(SocketEntry {
        socket: Some(Arc::new(accepted)),
        family,
        socket_type: SocketType::Stream,
        state: SocketState::Connected,
    });
    Ok((new_handle, peer))
}

fn sendable_socket(handle: SocketHandle) -> Result<Arc<Socket>, SocketError> {
    let registry = registry();
    let entry = registry.entry(handle)?;
    let socket = entry.socket.clone().ok_or(SocketError::Closed)?;

    // Streams must be connected; datagram handles can send and receive in
    // any open state.
    if entry.socket_type == SocketType::Stream && entry.state != SocketState::Connected {
        return Err(SocketError::InvalidState);
    }
    Ok(socket)
}

/// Send data on a connected stream handle or a datagram handle
///
/// # Returns
///
/// * `Ok(usize)` - Bytes accepted by the transport (may be fewer than
///   requested)
pub fn socket_send(handle: SocketHandle, buf: &[u8]) -> Result<usize, SocketError> {
    let socket = sendable_socket(handle)?;
    socket.send(buf)
}

/// Receive up to `max_len` bytes
///
/// Blocks until at least one byte arrives or the peer closes; an empty
/// buffer means orderly peer closure.
pub fn socket_recv(handle: SocketHandle, max_len: usize) -> Result<Vec<u8>, SocketError> {
    let socket = sendable_socket(handle)?;

    let mut buf = vec![0u8; max_len];
    let received = socket.recv(&mut buf)?;
    buf.truncate(received);
    Ok(buf)
}

fn datagram_socket(handle: SocketHandle) -> Result<Arc<Socket>, SocketError> {
    let registry = registry();
    let entry = registry.entry(handle)?;
    let socket = entry.socket.clone().ok_or(SocketError::Closed)?;

    if entry.socket_type != SocketType::Datagram {
        return Err(SocketError::NotSupported);
    }
    Ok(socket)
}

/// Send a datagram to a specific address (datagram only, no connect needed)
pub fn socket_send_to(
    handle: SocketHandle,
    buf: &[u8],
    addr: &SocketAddr,
) -> Result<usize, SocketError> {
    let socket = datagram_socket(handle)?;
    socket.send_to(buf, addr)
}

/// Receive a datagram and its sender address (datagram only)
///
/// Blocks until a datagram arrives.
pub fn socket_recv_from(
    handle: SocketHandle,
    max_len: usize,
) -> Result<(Vec<u8>, SocketAddr), SocketError> {
    let socket = datagram_socket(handle)?;

    let mut buf = vec![0u8; max_len];
    let (received, sender) = socket.recv_from(&mut buf)?;
    buf.truncate(received);
    Ok((buf, sender))
}

/// Get the handle's local address
pub fn socket_local_addr(handle: SocketHandle) -> Result<SocketAddr, SocketError> {
    let registry = registry();
    let entry = registry.entry(handle)?;
    let socket = entry.socket.as_ref().ok_or(SocketError::Closed)?;
    socket.local_addr()
}

/// Get the handle's peer address
pub fn socket_peer_addr(handle: SocketHandle) -> Result<SocketAddr, SocketError> {
    let registry = registry();
    let entry = registry.entry(handle)?;
    let socket = entry.socket.as_ref().ok_or(SocketError::Closed)?;
    socket.peer_addr()
}

/// Get the handle's lifecycle state
pub fn socket_state(handle: SocketHandle) -> Result<SocketState, SocketError> {
    let registry = registry();
    Ok(registry.entry(handle)?.state)
}

/// Release the handle
///
/// Drops the underlying socket, marks the entry `Closed`, and removes the
/// handle's descriptor from every poll set it was registered with. Any
/// further operation on the handle, including closing it again, fails with
/// `Closed`.
pub fn socket_close(handle: SocketHandle) -> Result<(), SocketError> {
    let released = {
        let mut registry = registry();
        let entry = registry.entry_mut(handle)?;
        let socket = entry.socket.take().ok_or(SocketError::Closed)?;
        entry.state = SocketState::Closed;
        socket
    };
    crate::poll_facades::purge_descriptor(released.as_raw_fd(), handle);
    // The descriptor closes when the last clone drops; a blocking call that
    // cloned the socket before this close finishes against a live
    // descriptor and cannot disturb other entries.
    drop(released);
    Ok(())
}

// Used by the poll facade to resolve a handle to its watched descriptor.
pub(crate) fn socket_poll_fd(handle: SocketHandle) -> Result<std::os::unix::io::RawFd, SocketError> {
    let registry = registry();
    let socket = registry.open_socket(handle)?;
    Ok(socket.as_raw_fd())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_net::types::{AF_INET, AF_INET6, SOCK_DGRAM, SOCK_STREAM};
    use std::net::Ipv4Addr;
    use std::thread;

    fn ephemeral() -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
    }

    #[test]
    fn test_create_with_bad_family() {
        assert_eq!(
            socket_create(-1, SOCK_STREAM),
            Err(SocketError::InvalidArgument)
        );
    }

    #[test]
    fn test_create_with_bad_type() {
        assert_eq!(
            socket_create(AF_INET, -1),
            Err(SocketError::InvalidArgument)
        );
    }

    #[test]
    fn test_create_starts_in_created_state() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        assert_eq!(socket_state(handle), Ok(SocketState::Created));
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_create_ipv6_datagram() {
        let handle = socket_create(AF_INET6, SOCK_DGRAM).unwrap();
        assert_eq!(socket_state(handle), Ok(SocketState::Created));
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_unknown_handle_is_invalid_argument() {
        let bogus = SocketHandle(u64::MAX);
        assert_eq!(socket_state(bogus), Err(SocketError::InvalidArgument));
        assert_eq!(socket_close(bogus), Err(SocketError::InvalidArgument));
    }

    #[test]
    fn test_listen_before_bind_is_invalid_state() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        assert_eq!(socket_listen(handle, 5), Err(SocketError::InvalidState));
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_listen_on_datagram_not_supported() {
        let handle = socket_create(AF_INET, SOCK_DGRAM).unwrap();
        socket_bind(handle, &ephemeral()).unwrap();
        assert_eq!(socket_listen(handle, 5), Err(SocketError::NotSupported));
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_accept_on_non_listener_is_invalid_state() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        match socket_accept(handle) {
            Err(SocketError::InvalidState) => {}
            other => panic!("expected InvalidState, got {:?}", other),
        }
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_double_bind_is_invalid_state() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        socket_bind(handle, &ephemeral()).unwrap();
        assert_eq!(
            socket_bind(handle, &ephemeral()),
            Err(SocketError::InvalidState)
        );
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_close_is_terminal() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        socket_close(handle).unwrap();

        assert_eq!(socket_state(handle), Ok(SocketState::Closed));
        assert_eq!(socket_close(handle), Err(SocketError::Closed));
        assert_eq!(socket_send(handle, b"x"), Err(SocketError::Closed));
        assert_eq!(socket_recv(handle, 8), Err(SocketError::Closed));
        assert_eq!(
            socket_bind(handle, &ephemeral()),
            Err(SocketError::Closed)
        );
    }

    #[test]
    fn test_stream_send_before_connect_is_invalid_state() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        assert_eq!(socket_send(handle, b"x"), Err(SocketError::InvalidState));
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_tcp_client_server_through_handles() {
        let listener = socket_create(AF_INET, SOCK_STREAM).unwrap();
        socket_bind(listener, &ephemeral()).unwrap();
        socket_listen(listener, 5).unwrap();
        let addr = socket_local_addr(listener).unwrap();

        let client_thread = thread::spawn(move || {
            let client = socket_create(AF_INET, SOCK_STREAM).unwrap();
            socket_connect(client, &addr).unwrap();
            assert_eq!(socket_state(client), Ok(SocketState::Connected));
            assert_eq!(socket_send(client, b"foo").unwrap(), 3);
            assert_eq!(socket_recv(client, 3).unwrap(), b"bar");
            socket_close(client).unwrap();
        });

        let (server, peer) = socket_accept(listener).unwrap();
        assert_ne!(server, listener);
        assert_eq!(peer.ip(), Ipv4Addr::LOCALHOST);
        assert_eq!(socket_state(listener), Ok(SocketState::Listening));
        assert_eq!(socket_state(server), Ok(SocketState::Connected));

        assert_eq!(socket_recv(server, 16).unwrap(), b"foo");
        assert_eq!(socket_send(server, b"bar").unwrap(), 3);

        client_thread.join().unwrap();
        socket_close(server).unwrap();
        socket_close(listener).unwrap();
    }

    #[test]
    fn test_failed_connect_returns_handle_to_created() {
        let probe = socket_create(AF_INET, SOCK_STREAM).unwrap();
        socket_bind(probe, &ephemeral()).unwrap();
        let unused = socket_local_addr(probe).unwrap();
        socket_close(probe).unwrap();

        let client = socket_create(AF_INET, SOCK_STREAM).unwrap();
        assert_eq!(
            socket_connect(client, &unused),
            Err(SocketError::ConnectionRefused)
        );
        assert_eq!(socket_state(client), Ok(SocketState::Created));
        socket_close(client).unwrap();
    }

    #[test]
    fn test_datagram_send_without_connect() {
        let receiver = socket_create(AF_INET, SOCK_DGRAM).unwrap();
        socket_bind(receiver, &ephemeral()).unwrap();
        let addr = socket_local_addr(receiver).unwrap();

        let sender = socket_create(AF_INET, SOCK_DGRAM).unwrap();
        assert_eq!(socket_send_to(sender, b"hello", &addr).unwrap(), 5);

        let (data, from) = socket_recv_from(receiver, 32).unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(from.ip(), Ipv4Addr::LOCALHOST);

        socket_close(sender).unwrap();
        socket_close(receiver).unwrap();
    }

    #[test]
    fn test_send_to_on_stream_not_supported() {
        let handle = socket_create(AF_INET, SOCK_STREAM).unwrap();
        let addr = ephemeral();
        assert_eq!(
            socket_send_to(handle, b"x", &addr),
            Err(SocketError::NotSupported)
        );
        socket_close(handle).unwrap();
    }

    #[test]
    fn test_connect_on_datagram_not_supported() {
        let handle = socket_create(AF_INET, SOCK_DGRAM).unwrap();
        let addr = ephemeral();
        assert_eq!(
            socket_connect(handle, &addr),
            Err(SocketError::NotSupported)
        );
        socket_close(handle).unwrap();
    }
}
