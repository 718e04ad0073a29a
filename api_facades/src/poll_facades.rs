//! Poll Facades
//!
//! Handle-based access to readiness polling. A poll-set handle owns a
//! `PollSet` plus the mapping from watched descriptors back to the socket
//! handles that registered them, so `poll_wait` can report readiness in
//! terms of socket handles.
//!
//! `poll_wait` snapshots the set and releases the registry lock before
//! blocking; registrations made from other threads during a wait take
//! effect on the next wait.

use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lazy_static::lazy_static;

use adapters_poll::PollSet;
use entities_net::SocketError;

use crate::socket_facades::{socket_poll_fd, SocketHandle};

/// Opaque reference to one poll set in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollHandle(u64);

impl PollHandle {
    /// Get the numeric id
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Longest wait a single `poll_wait` call performs
const MAX_WAIT: Duration = Duration::from_millis(i32::MAX as u64);

struct PollEntry {
    set: PollSet,
    members: HashMap<RawFd, SocketHandle>,
}

struct PollRegistry {
    entries: HashMap<u64, PollEntry>,
    next_id: u64,
}

impl PollRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    fn entry_mut(&mut self, handle: PollHandle) -> Result<&mut PollEntry, SocketError> {
        self.entries
            .get_mut(&handle.0)
            .ok_or(SocketError::InvalidArgument)
    }
}

lazy_static! {
    static ref POLL_REGISTRY: Mutex<PollRegistry> = Mutex::new(PollRegistry::new());
}

fn registry() -> MutexGuard<'static, PollRegistry> {
    POLL_REGISTRY.lock().unwrap()
}

/// Create an empty poll set
pub fn poll_create() -> PollHandle {
    let mut registry = registry();
    let id = registry.next_id;
    registry.next_id += 1;
    registry.entries.insert(
        id,
        PollEntry {
            set: PollSet::new(),
            members: HashMap::new(),
        },
    );
    PollHandle(id)
}

/// Register a socket handle with a poll set
///
/// Registering a handle that is already in the set is a no-op.
///
/// # Arguments
///
/// * `poll` - Poll set to add to
/// * `socket` - Socket handle to watch
///
/// # Returns
///
/// * `Ok(true)` - Newly added
/// * `Ok(false)` - Already registered
/// * `Err(SocketError::Closed)` - The socket handle has been released
pub fn poll_register(poll: PollHandle, socket: SocketHandle) -> Result<bool, SocketError> {
    let fd = socket_poll_fd(socket)?;

    let mut registry = registry();
    let entry = registry.entry_mut(poll)?;
    let added = entry.set.register(&fd);
    if added {
        entry.members.insert(fd, socket);
    }
    Ok(added)
}

/// Remove a socket handle from a poll set
///
/// # Returns
///
/// * `Ok(true)` - The handle was registered and has been removed
pub fn poll_unregister(poll: PollHandle, socket: SocketHandle) -> Result<bool, SocketError> {
    let mut registry = registry();
    let entry = registry.entry_mut(poll)?;

    let fd = match entry.members.iter().find(|(_, &h)| h == socket) {
        Some((&fd, _)) => fd,
        None => return Ok(false),
    };
    entry.members.remove(&fd);
    Ok(entry.set.unregister(&fd))
}

/// Wait for any registered handle to become ready
///
/// Blocks up to `timeout_seconds` waiting for a registered handle to become
/// readable or writable. A timeout with nothing ready returns an empty list,
/// not an error.
///
/// # Arguments
///
/// * `poll` - Poll set to wait on
/// * `timeout_seconds` - Maximum time to wait, in seconds
///
/// # Returns
///
/// * `Ok(handles)` - Socket handles that became ready; empty on timeout
pub fn poll_wait(poll: PollHandle, timeout_seconds: f64) -> Result<Vec<SocketHandle>, SocketError> {
    if !timeout_seconds.is_finite() || timeout_seconds < 0.0 {
        return Err(SocketError::InvalidArgument);
    }

    let (set, members) = {
        let mut registry = registry();
        let entry = registry.entry_mut(poll)?;
        (entry.set.clone(), entry.members.clone())
    };

    // poll(2) caps its wait at i32::MAX milliseconds; longer finite
    // requests clamp to that cap.
    let timeout = Duration::try_from_secs_f64(timeout_seconds)
        .unwrap_or(MAX_WAIT)
        .min(MAX_WAIT);
    let events = set
        .poll(Some(timeout))
        .map_err(|err| SocketError::Io(err.to_string()))?;

    Ok(events
        .iter()
        .filter_map(|event| members.get(&event.fd).copied())
        .collect())
}

// Called by socket_close: a released handle's descriptor must leave every
// poll set before the OS can reuse the descriptor number.
pub(crate) fn purge_descriptor(fd: RawFd, socket: SocketHandle) {
    let mut registry = registry();
    for entry in registry.entries.values_mut() {
        if entry.members.get(&fd) == Some(&socket) {
            entry.members.remove(&fd);
            entry.set.unregister(&fd);
        }
    }
}

/// Release a poll set handle
pub fn poll_close(poll: PollHandle) -> Result<(), SocketError> {
    let mut registry = registry();
    registry
        .entries
        .remove(&poll.0)
        .map(|_| ())
        .ok_or(SocketError::InvalidArgument)
}
