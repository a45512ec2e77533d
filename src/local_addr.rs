//! Best-effort address of this host on the local network
//!
//! Only used to print a URL other machines can try; it never influences what
//! the server binds to.

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr};

/// Why no network address was found
#[derive(Debug)]
pub enum LookupError {
    /// Interfaces could not be enumerated
    Unavailable(io::Error),
    /// Only loopback or link-local addresses are configured
    NoInterfaces,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "could not list network interfaces: {err}"),
            Self::NoInterfaces => "no non-loopback IPv4 address configured".fmt(f),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::NoInterfaces => None,
        }
    }
}

/// First usable IPv4 address of the host, `127.0.0.1` when there is none
pub fn resolve() -> Ipv4Addr {
    or_loopback(lookup())
}

/// First IPv4 address that is neither loopback nor link-local
pub fn lookup() -> Result<Ipv4Addr, LookupError> {
    let interfaces = if_addrs::get_if_addrs().map_err(LookupError::Unavailable)?;
    first_routable(interfaces.iter().map(|iface| iface.ip())).ok_or(LookupError::NoInterfaces)
}

fn or_loopback(found: Result<Ipv4Addr, LookupError>) -> Ipv4Addr {
    found.unwrap_or_else(|err| {
        log::debug!("Falling back to {} for the network URL: {err}", Ipv4Addr::LOCALHOST);
        Ipv4Addr::LOCALHOST
    })
}

fn first_routable(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(addr)
            if !addr.is_loopback() && !addr.is_link_local() && !addr.is_unspecified() =>
        {
            Some(addr)
        }
        _ => None,
    })
}

#[cfg(test)]
mod test {
    use std::net::Ipv6Addr;

    use super::*;

    #[test]
    fn picks_first_routable_ipv4() {
        let addrs = [
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6("fe80::1".parse().unwrap()),
            IpAddr::V4(Ipv4Addr::new(169, 254, 3, 4)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
        ];
        assert_eq!(
            first_routable(addrs),
            Some(Ipv4Addr::new(192, 168, 1, 20))
        );
    }

    #[test]
    fn loopback_only_host() {
        let addrs = [IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)];
        assert_eq!(first_routable(addrs), None);
        assert_eq!(
            or_loopback(first_routable(addrs).ok_or(LookupError::NoInterfaces)),
            Ipv4Addr::new(127, 0, 0, 1)
        );
    }

    #[test]
    fn no_interfaces_at_all() {
        assert_eq!(first_routable(Vec::<IpAddr>::new()), None);
    }

    #[test]
    fn enumeration_failure_falls_back() {
        let err = LookupError::Unavailable(io::Error::from(io::ErrorKind::Unsupported));
        assert_eq!(or_loopback(Err(err)), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn resolve_never_fails() {
        let addr = resolve();
        assert!(!addr.is_unspecified());
        assert!(!addr.is_link_local());
    }
}
