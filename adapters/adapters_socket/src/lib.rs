//! Adapters Layer: Socket Handles
//!
//! Blocking socket support for the abstraction layer. This crate wraps the
//! OS socket layer (via the `socket2` crate) behind a uniform [`Socket`]
//! wrapper plus typed [`TcpSocket`] and [`UdpSocket`] handles.
//!
//! ## Overview
//!
//! The `adapters_socket` crate provides:
//! - **`Socket`**: The core wrapper - create, bind, listen, accept, connect,
//!   send, recv, addressed datagram I/O, address queries
//! - **`TcpSocket`**: Stream transport handle
//! - **`UdpSocket`**: Datagram transport handle; addressed `send_to` and
//!   `recv_from` never require a prior connect
//! - **Poll integration**: Every handle implements `adapters_poll::Pollable`
//!
//! Sockets are created in blocking mode: `connect`, `accept`, and `recv`
//! suspend the calling thread until their condition is satisfied or a
//! transport error occurs. No operation retries internally.

pub mod socket;
pub mod tcp;
pub mod udp;

pub use entities_net::{AddressFamily, Protocol, SocketError, SocketType};
pub use socket::Socket;
pub use tcp::TcpSocket;
pub use udp::UdpSocket;
