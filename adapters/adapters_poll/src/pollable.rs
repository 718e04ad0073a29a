//! Pollable Capability
//!
//! The readiness-check primitive. A type registers with a [`PollSet`] by
//! exposing the raw descriptor the OS should watch; the socket handle types
//! in `adapters_socket` implement this.
//!
//! [`PollSet`]: crate::poll_set::PollSet

use std::os::unix::io::RawFd;

/// Capability for registering with a poll set
///
/// Implementors expose the descriptor whose readiness the poll set watches.
/// The descriptor must stay valid for as long as the implementor remains
/// registered.
#[cfg_attr(test, mockall::automock)]
pub trait Pollable {
    /// Get the raw descriptor to watch for readiness
    fn poll_fd(&self) -> RawFd;
}

impl Pollable for RawFd {
    fn poll_fd(&self) -> RawFd {
        *self
    }
}
