//! API Facades Layer: Handle-Based Socket Surface
//!
//! The outermost layer of the socket abstraction. Callers that do not want
//! the typed handles from `adapters_socket` work entirely through opaque
//! handles: create a socket from raw family/type codes, drive it through its
//! lifecycle, and watch it for readiness through a poll-set handle.
//!
//! ## Overview
//!
//! The `api_facades` crate provides:
//! - **Socket facades**: A global handle table mapping `SocketHandle` values
//!   to socket entries, with dispatch by socket type and lifecycle-state
//!   enforcement
//! - **Poll facades**: Poll-set handles whose `poll_wait` maps ready
//!   descriptors back to the socket handles that own them
//! - **Raw codes**: `AF_INET`, `AF_INET6`, `SOCK_STREAM`, `SOCK_DGRAM`;
//!   unrecognized codes fail with `InvalidArgument` before any driver call
//!
//! Blocking operations clone the entry's socket out of the table and release
//! the table lock first, so a suspended `accept` or `recv` never blocks
//! operations on unrelated handles.

pub mod poll_facades;
pub mod socket_facades;

pub use entities_net::types::{AF_INET, AF_INET6, SOCK_DGRAM, SOCK_STREAM};
pub use entities_net::{SocketError, SocketState};
pub use poll_facades::{
    poll_close, poll_create, poll_register, poll_unregister, poll_wait, PollHandle,
};
pub use socket_facades::{
    socket_accept, socket_bind, socket_close, socket_connect, socket_create, socket_listen,
    socket_local_addr, socket_peer_addr, socket_recv, socket_recv_from, socket_send,
    socket_send_to, socket_state, SocketHandle,
};
