//! Pick the family and port to serve on
//!
//! Dual-stack is tried first.  Whether the host supports it is decided once,
//! before any port is probed; if it turns out unusable part-way through the
//! scan the selector still commits to IPv4-only and restarts from the first
//! port, so the outcome never depends on where in the range the failure
//! showed up.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::bind::{Family, PortProbe, ProbeError};
use crate::Error;

/// Ports and host for [`select`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindRequest {
    first: u16,
    last: u16,
    host: Ipv4Addr,
    dual_stack: bool,
}

impl BindRequest {
    /// Scan `first..=last`, dual-stack first, falling back to IPv4 on all interfaces
    pub fn new(first: u16, last: u16) -> Self {
        Self {
            first,
            last,
            host: Ipv4Addr::UNSPECIFIED,
            dual_stack: true,
        }
    }

    /// Override the host used by the IPv4-only strategy
    ///
    /// The dual-stack strategy always binds the IPv6 wildcard.
    pub fn host(&mut self, host: Ipv4Addr) -> &mut Self {
        self.host = host;
        self
    }

    /// Whether to attempt dual-stack at all
    pub fn dual_stack(&mut self, yes: bool) -> &mut Self {
        self.dual_stack = yes;
        self
    }

    pub fn first(&self) -> u16 {
        self.first
    }

    pub fn last(&self) -> u16 {
        self.last
    }

    fn ports(&self) -> std::ops::RangeInclusive<u16> {
        self.first..=self.last
    }

    fn exhausted(&self) -> Error {
        Error::NoPortAvailable {
            first: self.first,
            last: self.last,
        }
    }
}

/// Where the server is going to listen
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindOutcome {
    pub family: Family,
    pub host: IpAddr,
    pub port: u16,
}

impl BindOutcome {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

enum Scan {
    Found(u16),
    Exhausted,
    FamilyUnavailable(u16, io::Error),
}

/// Find the lowest free port, preferring dual-stack
pub fn select(probe: &impl PortProbe, request: &BindRequest) -> Result<BindOutcome, Error> {
    if request.dual_stack {
        let family = Family::DualStack;
        let host = Family::DUAL_STACK_WILDCARD;
        match probe.family_available(family) {
            Ok(()) => match scan(probe, family, host, request)? {
                Scan::Found(port) => return Ok(BindOutcome { family, host, port }),
                Scan::Exhausted => return Err(request.exhausted()),
                Scan::FamilyUnavailable(port, err) => {
                    log::debug!("Dual-stack stopped working at port {port} ({err}), using IPv4 only");
                }
            },
            Err(err) => {
                log::debug!("Dual-stack unavailable ({err}), using IPv4 only");
            }
        }
    }

    let family = Family::Ipv4Only;
    let host = IpAddr::V4(request.host);
    match scan(probe, family, host, request)? {
        Scan::Found(port) => Ok(BindOutcome { family, host, port }),
        Scan::Exhausted => Err(request.exhausted()),
        Scan::FamilyUnavailable(port, source) => Err(Error::Bind {
            family,
            addr: SocketAddr::new(host, port),
            source,
        }),
    }
}

fn scan(
    probe: &impl PortProbe,
    family: Family,
    host: IpAddr,
    request: &BindRequest,
) -> Result<Scan, Error> {
    for port in request.ports() {
        match probe.probe(family, host, port) {
            Ok(()) => {
                log::debug!("Port {port} is free ({family})");
                return Ok(Scan::Found(port));
            }
            Err(ProbeError::AddressInUse) => {
                log::trace!("Port {port} is in use ({family})");
            }
            Err(ProbeError::FamilyUnavailable(err)) => {
                return Ok(Scan::FamilyUnavailable(port, err));
            }
            Err(ProbeError::Other(source)) => {
                return Err(Error::Bind {
                    family,
                    addr: SocketAddr::new(host, port),
                    source,
                });
            }
        }
    }
    Ok(Scan::Exhausted)
}
