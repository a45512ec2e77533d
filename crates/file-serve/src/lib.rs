//! > An HTTP Static File Server
//!
//! `file-serve` focuses on quickly exposing a directory to the local machine
//! and network.  It prioritizes small size and compile times over speed,
//! scalability, or security.
//!
//! The listening port is picked by [`select()`]: the first free port of a range,
//! preferring a dual-stack (IPv4 + IPv6) socket and falling back to IPv4 when
//! the host has no usable IPv6 stack.
//!
//! # Example
//!
//! ```rust,no_run
//! let path = std::env::current_dir().unwrap();
//! let outcome = file_serve::select(&file_serve::SocketProbe, &file_serve::BindRequest::new(7000, 7100)).unwrap();
//! let server = file_serve::Server::bind(&path, outcome).unwrap();
//!
//! println!("Serving {}", path.display());
//! println!("See http://localhost:{}", server.addr().port());
//! println!("Hit CTRL-C to stop");
//!
//! server.serve().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::io;
use std::net::SocketAddr;
use std::sync::RwLock;

pub mod bind;
mod handler;
pub mod select;

pub use bind::{Family, PortProbe, ProbeError, SocketProbe};
pub use select::{select, BindOutcome, BindRequest};

pub struct Server {
    source: std::path::PathBuf,
    family: Family,
    addr: SocketAddr,
    server: RwLock<Option<tiny_http::Server>>,
}

impl Server {
    /// Claim the listening socket described by `outcome`
    ///
    /// The socket is held from here on; [`Server::serve`] starts answering
    /// requests on it.
    pub fn bind(source: impl Into<std::path::PathBuf>, outcome: BindOutcome) -> Result<Self, Error> {
        let family = outcome.family;
        let listener = bind::listen(family, outcome.addr()).map_err(|err| match err {
            ProbeError::AddressInUse => Error::Bind {
                family,
                addr: outcome.addr(),
                source: io::ErrorKind::AddrInUse.into(),
            },
            ProbeError::FamilyUnavailable(source) | ProbeError::Other(source) => Error::Bind {
                family,
                addr: outcome.addr(),
                source,
            },
        })?;
        let addr = listener.local_addr()?;
        let server = tiny_http::Server::from_listener(listener, None).map_err(Error::Http)?;
        log::info!("Listening on {addr} ({family})");

        Ok(Self {
            source: source.into(),
            family,
            addr,
            server: RwLock::new(Some(server)),
        })
    }

    /// The location being served
    pub fn source(&self) -> &std::path::Path {
        self.source.as_path()
    }

    /// The address the server is bound to
    ///
    /// For a dual-stack server this is the IPv6 wildcard.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Whether the listening socket is still held
    pub fn is_running(&self) -> bool {
        matches!(self.server.read().as_deref(), Ok(Some(_)))
    }

    /// Answer requests until [`Server::close`] is called
    ///
    /// The listening socket is released before returning.
    pub fn serve(&self) -> Result<(), Error> {
        {
            let server = self.server.read().map_err(Error::poisoned)?;
            let server = server.as_ref().ok_or(Error::Closed)?;
            for request in server.incoming_requests() {
                // Requests are not logged; failures are almost always the client hanging up
                if let Err(e) = handler::static_file_handler(self.source(), request) {
                    log::trace!("{e}");
                }
            }
        }

        *self.server.write().map_err(Error::poisoned)? = None;
        log::info!("Released {}", self.addr);

        Ok(())
    }

    /// Closes the server gracefully
    pub fn close(&self) {
        if let Ok(Some(server)) = self.server.read().as_deref() {
            server.unblock();
        }
    }
}

/// Serve Error
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Every port of the range was taken
    NoPortAvailable { first: u16, last: u16 },
    /// The OS refused the socket for a reason other than the port being taken
    ///
    /// Reported for the one port that failed, the scan stops there.
    Bind {
        family: Family,
        addr: SocketAddr,
        source: io::Error,
    },
    /// [`Server::serve`] after the server was shut down
    Closed,
    Http(Box<dyn std::error::Error + Send + Sync>),
    Io(io::Error),
}

impl Error {
    fn poisoned(error: impl ToString) -> Self {
        Self::Io(io::Error::other(error.to_string()))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPortAvailable { first, last } => {
                write!(fmt, "no available ports between {first} and {last}")
            }
            Self::Bind { family, addr, .. } => write!(fmt, "failed to listen on {addr} ({family})"),
            Self::Closed => "the server has been shut down".fmt(fmt),
            Self::Http(error) => error.fmt(fmt),
            Self::Io(error) => error.fmt(fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(error) => std::error::Error::source(error),
            Self::NoPortAvailable { .. } | Self::Closed | Self::Http(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read as _, Write as _};
    use std::net::{Ipv4Addr, Ipv6Addr, TcpStream};
    use std::sync::Arc;

    use super::*;

    fn loopback() -> BindOutcome {
        BindOutcome {
            family: Family::Ipv4Only,
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
        }
    }

    fn request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        request(addr, "GET", path)
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>hello</p>").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        dir
    }

    #[test]
    fn serves_until_closed() {
        let dir = site();

        let server = Arc::new(Server::bind(dir.path(), loopback()).unwrap());
        let addr = server.addr();
        assert!(server.is_running());

        let handle = {
            let server = server.clone();
            std::thread::spawn(move || server.serve())
        };

        let found = get(addr, "/index.html");
        assert!(found.starts_with("HTTP/1.1 200"), "{found}");
        assert!(found.contains("text/html"), "{found}");
        assert!(found.ends_with("<p>hello</p>"), "{found}");

        let head = request(addr, "HEAD", "/index.html");
        assert!(head.starts_with("HTTP/1.1 200"), "{head}");
        assert!(head.contains("text/html"), "{head}");
        assert!(head.ends_with("\r\n\r\n"), "{head}");
        assert!(!head.contains("<p>hello</p>"), "{head}");

        let post = request(addr, "POST", "/index.html");
        assert!(post.starts_with("HTTP/1.1 501"), "{post}");

        let redirect = get(addr, "/docs?lang=en");
        assert!(redirect.starts_with("HTTP/1.1 301"), "{redirect}");
        assert!(
            redirect.contains("Location: /docs/?lang=en\r\n"),
            "{redirect}"
        );

        let docs = get(addr, "/docs/");
        assert!(docs.ends_with("<p>docs</p>"), "{docs}");

        let missing = get(addr, "/missing.html");
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        server.close();
        handle.join().unwrap().unwrap();
        assert!(!server.is_running());
        assert!(matches!(server.serve(), Err(Error::Closed)));
    }

    #[test]
    fn dual_stack_accepts_both_families() {
        if SocketProbe.family_available(Family::DualStack).is_err() {
            return;
        }
        let dir = site();
        let outcome = BindOutcome {
            family: Family::DualStack,
            host: Family::DUAL_STACK_WILDCARD,
            port: 0,
        };

        let server = Arc::new(Server::bind(dir.path(), outcome).unwrap());
        let port = server.addr().port();
        let handle = {
            let server = server.clone();
            std::thread::spawn(move || server.serve())
        };

        let v6 = get(SocketAddr::new(Ipv6Addr::LOCALHOST.into(), port), "/index.html");
        assert!(v6.starts_with("HTTP/1.1 200"), "{v6}");
        assert!(v6.ends_with("<p>hello</p>"), "{v6}");

        let v4 = get(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), port), "/index.html");
        assert!(v4.starts_with("HTTP/1.1 200"), "{v4}");

        server.close();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn bind_reports_held_port() {
        let held = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let outcome = BindOutcome {
            port: held.local_addr().unwrap().port(),
            ..loopback()
        };

        let dir = tempfile::tempdir().unwrap();
        let err = Server::bind(dir.path(), outcome).err().unwrap();
        match err {
            Error::Bind { source, .. } => assert_eq!(source.kind(), io::ErrorKind::AddrInUse),
            err => panic!("unexpected error: {err}"),
        }
    }
}
