//! Poll Set
//!
//! A duplicate-free collection of watched descriptors with a blocking wait
//! for readiness. Registration watches for both readability and writability;
//! error conditions are always reported by the OS.
//!
//! The wait is built directly on `poll(2)`. A timeout with no ready
//! descriptor yields an empty event list, never an error. `EINTR` is retried
//! within the remaining deadline.

use std::fmt;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use nix::errno::Errno;

use crate::pollable::Pollable;

/// Readiness information for one descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEvent {
    /// Descriptor that became ready
    pub fd: RawFd,
    /// Data can be read without blocking (includes peer hang-up, since a
    /// read after hang-up returns immediately)
    pub readable: bool,
    /// Buffer space is available for writing
    pub writable: bool,
    /// The OS reported an error or invalid-descriptor condition
    pub error: bool,
}

/// Poll errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    /// The underlying poll(2) call failed
    PollFailed(Errno),
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::PollFailed(errno) => write!(f, "poll failed: {}", errno),
        }
    }
}

impl std::error::Error for PollError {}

/// Collection of descriptors registered for readiness notification
///
/// Owned by the caller; mutated only via explicit [`register`] and
/// [`unregister`] calls. Re-registering a descriptor already in the set is a
/// no-op.
///
/// [`register`]: PollSet::register
/// [`unregister`]: PollSet::unregister
#[derive(Debug, Clone, Default)]
pub struct PollSet {
    fds: Vec<RawFd>,
}

impl PollSet {
    /// Create an empty poll set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pollable to the watched set
    ///
    /// # Arguments
    ///
    /// * `pollable` - Source of the descriptor to watch
    ///
    /// # Returns
    ///
    /// `true` if the descriptor was added, `false` if it was already present
    pub fn register(&mut self, pollable: &impl Pollable) -> bool {
        let fd = pollable.poll_fd();
        if self.fds.contains(&fd) {
            return false;
        }
        self.fds.push(fd);
        true
    }

    /// Remove a pollable from the watched set
    ///
    /// # Arguments
    ///
    /// * `pollable` - Source of the descriptor to stop watching
    ///
    /// # Returns
    ///
    /// `true` if the descriptor was present and removed
    pub fn unregister(&mut self, pollable: &impl Pollable) -> bool {
        let fd = pollable.poll_fd();
        match self.fds.iter().position(|&f| f == fd) {
            Some(index) => {
                self.fds.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check whether a pollable's descriptor is in the set
    pub fn contains(&self, pollable: &impl Pollable) -> bool {
        self.fds.contains(&pollable.poll_fd())
    }

    /// Number of watched descriptors
    pub fn len(&self) -> usize {
        self.fds.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    /// Wait for any registered descriptor to become ready
    ///
    /// Blocks until at least one descriptor is readable or writable, the
    /// timeout expires, or an error occurs. `None` waits indefinitely.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait (`None` = no limit)
    ///
    /// # Returns
    ///
    /// * `Ok(events)` - Readiness per ready descriptor; empty on timeout
    /// * `Err(PollError)` - The poll call itself failed
    pub fn poll(&self, timeout: Option<Duration>) -> Result<Vec<PollEvent>, PollError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut fds: Vec<libc::pollfd> = self
            .fds
            .iter()
            .map(|&fd| libc::pollfd {
                fd,
                events: libc::POLLIN | libc::POLLOUT,
                revents: 0,
            })
            .collect();

        loop {
            let timeout_ms: libc::c_int = match deadline {
                None => -1,
                Some(d) => remaining_millis(d),
            };

            for entry in fds.iter_mut() {
                entry.revents = 0;
            }

            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };

            if rc < 0 {
                let errno = Errno::last();
                if errno == Errno::EINTR {
                    if let Some(d) = deadline {
                        if Instant::now() >= d {
                            return Ok(Vec::new());
                        }
                    }
                    continue;
                }
                return Err(PollError::PollFailed(errno));
            }

            if rc == 0 {
                return Ok(Vec::new());
            }

            let events = fds
                .iter()
                .filter(|entry| entry.revents != 0)
                .map(|entry| PollEvent {
                    fd: entry.fd,
                    readable: entry.revents & (libc::POLLIN | libc::POLLPRI | libc::POLLHUP) != 0,
                    writable: entry.revents & libc::POLLOUT != 0,
                    error: entry.revents & (libc::POLLERR | libc::POLLNVAL) != 0,
                })
                .collect();
            return Ok(events);
        }
    }
}

/// Milliseconds until the deadline, rounded up so short timeouts still sleep
fn remaining_millis(deadline: Instant) -> libc::c_int {
    let now = Instant::now();
    if now >= deadline {
        return 0;
    }
    let remaining = deadline - now;
    let ms = remaining.as_millis();
    if ms == 0 {
        return 1;
    }
    ms.min(i32::MAX as u128) as libc::c_int
}
