//! Address Family and Socket Type Definitions
//!
//! Provides the transport vocabulary used throughout the socket layer. Each
//! enum can be parsed from the conventional raw integer codes so callers that
//! speak in codes (the handle-based facade) get `InvalidArgument` for values
//! the layer does not recognize.

use crate::error::SocketError;

/// Raw code for the IPv4 address family.
pub const AF_INET: i32 = 2;
/// Raw code for the IPv6 address family.
pub const AF_INET6: i32 = 10;
/// Raw code for stream sockets.
pub const SOCK_STREAM: i32 = 1;
/// Raw code for datagram sockets.
pub const SOCK_DGRAM: i32 = 2;

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Parse an address family from its raw code
    ///
    /// # Arguments
    ///
    /// * `code` - Raw family code (`AF_INET` or `AF_INET6`)
    ///
    /// # Returns
    ///
    /// * `Ok(AddressFamily)` - Recognized family
    /// * `Err(SocketError::InvalidArgument)` - Unrecognized code
    pub fn from_code(code: i32) -> Result<Self, SocketError> {
        match code {
            AF_INET => Ok(AddressFamily::Ipv4),
            AF_INET6 => Ok(AddressFamily::Ipv6),
            _ => Err(SocketError::InvalidArgument),
        }
    }

    /// Get the raw code for this family
    pub fn code(&self) -> i32 {
        match self {
            AddressFamily::Ipv4 => AF_INET,
            AddressFamily::Ipv6 => AF_INET6,
        }
    }
}

/// Socket type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// Stream socket (TCP)
    Stream,
    /// Datagram socket (UDP)
    Datagram,
}

impl SocketType {
    /// Parse a socket type from its raw code
    ///
    /// # Arguments
    ///
    /// * `code` - Raw type code (`SOCK_STREAM` or `SOCK_DGRAM`)
    ///
    /// # Returns
    ///
    /// * `Ok(SocketType)` - Recognized type
    /// * `Err(SocketError::InvalidArgument)` - Unrecognized code
    pub fn from_code(code: i32) -> Result<Self, SocketError> {
        match code {
            SOCK_STREAM => Ok(SocketType::Stream),
            SOCK_DGRAM => Ok(SocketType::Datagram),
            _ => Err(SocketError::InvalidArgument),
        }
    }

    /// Get the raw code for this type
    pub fn code(&self) -> i32 {
        match self {
            SocketType::Stream => SOCK_STREAM,
            SocketType::Datagram => SOCK_DGRAM,
        }
    }

    /// Get the protocol that carries this socket type
    pub fn protocol(&self) -> Protocol {
        match self {
            SocketType::Stream => Protocol::Tcp,
            SocketType::Datagram => Protocol::Udp,
        }
    }
}

/// Protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
}
