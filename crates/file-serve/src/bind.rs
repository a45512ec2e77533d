//! Listener acquisition and port probing
//!
//! Every listener goes through the same steps: create a socket for the
//! [`Family`], configure it (dual-stack or not), bind it, then activate it with
//! `listen`.  The socket is owned throughout, so it is released whichever step
//! fails.  Address reuse is never enabled, so a port held by another listener
//! reliably reports [`ProbeError::AddressInUse`].

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv6Addr, SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};

const BACKLOG: i32 = 128;

/// Address family strategy for the listening socket
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    /// A single IPv6 socket that also accepts IPv4 clients as mapped addresses
    DualStack,
    /// A plain IPv4 socket
    Ipv4Only,
}

impl Family {
    /// The address a dual-stack listener binds to
    pub const DUAL_STACK_WILDCARD: IpAddr = IpAddr::V6(Ipv6Addr::UNSPECIFIED);

    fn domain(self) -> Domain {
        match self {
            Self::DualStack => Domain::IPV6,
            Self::Ipv4Only => Domain::IPV4,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DualStack => "IPv4 + IPv6".fmt(f),
            Self::Ipv4Only => "IPv4 only".fmt(f),
        }
    }
}

/// Why a port could not be claimed
#[derive(Debug)]
pub enum ProbeError {
    /// Another listener holds the port
    AddressInUse,
    /// The family (or dual-stack mode) cannot be used on this host
    FamilyUnavailable(io::Error),
    /// Anything else the OS reported, e.g. permission denied
    Other(io::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressInUse => "address already in use".fmt(f),
            Self::FamilyUnavailable(err) => write!(f, "address family unavailable: {err}"),
            Self::Other(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AddressInUse => None,
            Self::FamilyUnavailable(err) | Self::Other(err) => Some(err),
        }
    }
}

pub type ProbeResult = Result<(), ProbeError>;

/// Checks whether a port can be listened on
pub trait PortProbe {
    /// Whether a socket of `family` can be created and configured at all
    ///
    /// Nothing is bound, so the answer does not depend on any port.
    fn family_available(&self, family: Family) -> ProbeResult;

    /// Claim `(host, port)` and release it immediately
    fn probe(&self, family: Family, host: IpAddr, port: u16) -> ProbeResult;
}

/// [`PortProbe`] backed by real sockets
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SocketProbe;

impl PortProbe for SocketProbe {
    fn family_available(&self, family: Family) -> ProbeResult {
        create(family).map(drop)
    }

    fn probe(&self, family: Family, host: IpAddr, port: u16) -> ProbeResult {
        let listener = listen(family, SocketAddr::new(host, port))?;
        drop(listener);
        Ok(())
    }
}

/// Open a listening socket at `addr`
pub fn listen(family: Family, addr: SocketAddr) -> Result<TcpListener, ProbeError> {
    let socket = create(family)?;
    socket
        .bind(&addr.into())
        .map_err(|err| classify(addr, err))?;
    socket.listen(BACKLOG).map_err(|err| classify(addr, err))?;
    Ok(socket.into())
}

fn create(family: Family) -> Result<Socket, ProbeError> {
    let socket = Socket::new(family.domain(), Type::STREAM, Some(Protocol::TCP))
        .map_err(ProbeError::FamilyUnavailable)?;
    if family == Family::DualStack {
        socket
            .set_only_v6(false)
            .map_err(ProbeError::FamilyUnavailable)?;
    }
    Ok(socket)
}

fn classify(addr: SocketAddr, err: io::Error) -> ProbeError {
    match err.kind() {
        io::ErrorKind::AddrInUse => ProbeError::AddressInUse,
        // The wildcard is always assignable when the family has a working stack
        io::ErrorKind::AddrNotAvailable if addr.ip().is_unspecified() => {
            ProbeError::FamilyUnavailable(err)
        }
        _ => ProbeError::Other(err),
    }
}
