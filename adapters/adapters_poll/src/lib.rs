//! Adapters Layer: Readiness Polling
//!
//! Provides the readiness-polling facility for the socket layer: a `PollSet`
//! of registered descriptors and a `Pollable` capability trait implemented by
//! the socket handle types.
//!
//! ## Overview
//!
//! The `adapters_poll` crate provides:
//! - **`Pollable`**: The explicit readiness-check capability. Anything that
//!   can expose a raw descriptor can be watched for readiness
//! - **`PollSet`**: A duplicate-free collection of watched descriptors with
//!   a blocking `poll` that waits up to a timeout for any of them to become
//!   readable or writable
//!
//! A timeout with nothing ready is not an error; `poll` returns an empty
//! event list. Polling is built directly on `poll(2)`.

pub mod poll_set;
pub mod pollable;

pub use poll_set::{PollError, PollEvent, PollSet};
pub use pollable::Pollable;
