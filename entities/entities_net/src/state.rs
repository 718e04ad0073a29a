//! Socket Lifecycle State Machine
//!
//! Encodes the states a socket handle moves through and which transitions are
//! legal for each socket type. Stream handles follow either the server path
//! (`Created -> Bound -> Listening`, with accept producing new `Connected`
//! handles) or the client path (`Created -> Connecting -> Connected`).
//! Datagram handles have no connection phase: they go from `Created`
//! (optionally through `Bound`) straight to `Closed`. `Closed` is terminal
//! for both kinds.

use crate::types::SocketType;

/// Socket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketState {
    /// Freshly created, no address reserved
    Created,
    /// Local address reserved
    Bound,
    /// Accepting inbound connections (stream only)
    Listening,
    /// Connection attempt in flight (stream only)
    Connecting,
    /// Connected to a peer (stream only)
    Connected,
    /// Released; no further I/O permitted
    Closed,
}

impl SocketState {
    /// Check whether a transition to `next` is legal for the given socket type
    ///
    /// # Arguments
    ///
    /// * `next` - Target state
    /// * `socket_type` - Transport kind of the handle
    ///
    /// # Returns
    ///
    /// `true` when the transition is part of the lifecycle for that kind
    pub fn may_transition(self, next: SocketState, socket_type: SocketType) -> bool {
        use SocketState::*;
        match socket_type {
            SocketType::Stream => matches!(
                (self, next),
                (Created, Bound)
                    | (Created, Connecting)
                    | (Created, Closed)
                    | (Bound, Listening)
                    | (Bound, Closed)
                    | (Listening, Closed)
                    | (Connecting, Connected)
                    // A failed connect attempt returns the handle to Created.
                    | (Connecting, Created)
                    | (Connecting, Closed)
                    | (Connected, Closed)
            ),
            SocketType::Datagram => matches!(
                (self, next),
                (Created, Bound) | (Created, Closed) | (Bound, Closed)
            ),
        }
    }

    /// Whether I/O is still permitted in this state
    pub fn is_open(self) -> bool {
        self != SocketState::Closed
    }
}
