use std::net::Ipv4Addr;
use std::path::PathBuf;

use file_serve::BindRequest;

/// Port tried first when none is given
pub const DEFAULT_PORT: u16 = 7000;

/// How many ports past the preferred one are scanned by default
pub const DEFAULT_PORT_SPAN: u16 = 100;

/// Settled settings for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub root: PathBuf,
    pub preferred_port: u16,
    pub max_port: u16,
    /// Host for the IPv4-only strategy
    pub bind_host: Ipv4Addr,
    pub ipv4_only: bool,
    pub print_only: bool,
    pub open: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            preferred_port: DEFAULT_PORT,
            max_port: default_max_port(DEFAULT_PORT),
            bind_host: Ipv4Addr::UNSPECIFIED,
            ipv4_only: false,
            print_only: false,
            open: false,
        }
    }
}

impl ServerConfig {
    /// Defaults, scanning from `preferred_port`
    pub fn with_port(preferred_port: u16) -> Self {
        Self {
            preferred_port,
            max_port: default_max_port(preferred_port),
            ..Default::default()
        }
    }

    pub fn bind_request(&self) -> BindRequest {
        let mut request = BindRequest::new(self.preferred_port, self.max_port);
        request.host(self.bind_host).dual_stack(!self.ipv4_only);
        request
    }
}

/// Last port scanned when only the preferred one is known
pub fn default_max_port(preferred_port: u16) -> u16 {
    preferred_port.saturating_add(DEFAULT_PORT_SPAN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_scans_one_hundred_ports() {
        let config = ServerConfig::default();
        assert_eq!(config.preferred_port, 7000);
        assert_eq!(config.max_port, 7100);
        assert_eq!(config.bind_host, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn max_port_saturates() {
        assert_eq!(default_max_port(65500), u16::MAX);
        assert_eq!(ServerConfig::with_port(9500).max_port, 9600);
    }

    #[test]
    fn bind_request_follows_config() {
        let config = ServerConfig {
            bind_host: Ipv4Addr::LOCALHOST,
            ipv4_only: true,
            ..ServerConfig::with_port(8000)
        };
        let mut expected = BindRequest::new(8000, 8100);
        expected.host(Ipv4Addr::LOCALHOST).dual_stack(false);
        assert_eq!(config.bind_request(), expected);
    }
}
