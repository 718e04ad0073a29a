//! Entities Layer: Core Networking Types
//!
//! Pure domain types for the socket abstraction layer. This crate holds the
//! vocabulary shared by every outer layer: address families, socket types,
//! protocols, the socket lifecycle state machine, and the error taxonomy.
//!
//! ## Overview
//!
//! The `entities_net` crate provides:
//! - **Address families and socket types**: With raw-code parsing so that
//!   unrecognized codes fail with `InvalidArgument` instead of reaching the
//!   underlying driver
//! - **Lifecycle states**: The valid state transitions for stream and
//!   datagram handles
//! - **Error taxonomy**: `SocketError` with classification of `io::Error`
//!   values reported by the OS socket layer
//!
//! This crate performs no I/O and has no dependencies.

pub mod error;
pub mod state;
pub mod types;

pub use error::SocketError;
pub use state::SocketState;
pub use types::{AddressFamily, Protocol, SocketType};
