//! Socket Error Taxonomy
//!
//! The error vocabulary for the socket layer. Driver failures reported by the
//! OS are classified into distinct transport variants; argument and lifecycle
//! violations get their own variants so callers can tell misuse apart from
//! network conditions. No operation in the layer retries on error; recovery
//! policy belongs to the caller.

use std::fmt;
use std::io;

/// Socket error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketError {
    /// Unsupported address family or socket type
    InvalidArgument,
    /// Operation attempted on a released handle
    Closed,
    /// Operation not valid in the handle's current lifecycle state
    InvalidState,
    /// Operation not defined for this socket type
    NotSupported,
    /// Blocking operation exceeded its deadline
    Timeout,
    /// Invalid address
    InvalidAddress,
    /// Address already in use
    AddressInUse,
    /// Connection refused
    ConnectionRefused,
    /// Connection reset
    ConnectionReset,
    /// Connection aborted
    ConnectionAborted,
    /// Network unreachable
    NetworkUnreachable,
    /// Host unreachable
    HostUnreachable,
    /// Other I/O error
    Io(String),
}

impl SocketError {
    /// Whether this error reports a failure of the underlying transport
    /// (as opposed to caller misuse of the handle)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SocketError::InvalidAddress
                | SocketError::AddressInUse
                | SocketError::ConnectionRefused
                | SocketError::ConnectionReset
                | SocketError::ConnectionAborted
                | SocketError::NetworkUnreachable
                | SocketError::HostUnreachable
                | SocketError::Io(_)
        )
    }
}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidInput => SocketError::InvalidArgument,
            ErrorKind::AddrInUse => SocketError::AddressInUse,
            ErrorKind::AddrNotAvailable => SocketError::InvalidAddress,
            ErrorKind::ConnectionRefused => SocketError::ConnectionRefused,
            ErrorKind::ConnectionReset => SocketError::ConnectionReset,
            ErrorKind::ConnectionAborted => SocketError::ConnectionAborted,
            ErrorKind::NotConnected => SocketError::InvalidState,
            ErrorKind::TimedOut => SocketError::Timeout,
            _ => SocketError::Io(err.to_string()),
        }
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::InvalidArgument => {
                write!(f, "unsupported address family or socket type")
            }
            SocketError::Closed => write!(f, "socket handle has been closed"),
            SocketError::InvalidState => {
                write!(f, "operation not valid in the current socket state")
            }
            SocketError::NotSupported => {
                write!(f, "operation not supported for this socket type")
            }
            SocketError::Timeout => write!(f, "operation timed out"),
            SocketError::InvalidAddress => write!(f, "invalid address"),
            SocketError::AddressInUse => write!(f, "address already in use"),
            SocketError::ConnectionRefused => write!(f, "connection refused"),
            SocketError::ConnectionReset => write!(f, "connection reset"),
            SocketError::ConnectionAborted => write!(f, "connection aborted"),
            SocketError::NetworkUnreachable => write!(f, "network unreachable"),
            SocketError::HostUnreachable => write!(f, "host unreachable"),
            SocketError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SocketError {}
