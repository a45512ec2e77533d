use std::fmt;
use std::net::Ipv4Addr;

/// A URL worth trying in a browser, with a hint on when to use it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub note: &'static str,
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  ({})", self.url, self.note)
    }
}

/// Where the served `index.html` can be reached
///
/// `localhost` matters for PWAs since browsers only treat it (and HTTPS) as a
/// secure context.
pub fn candidate_urls(port: u16, local_ip: Ipv4Addr) -> [CandidateUrl; 3] {
    [
        CandidateUrl {
            url: index_url("localhost", port),
            note: "for PWA install",
        },
        CandidateUrl {
            url: index_url(&Ipv4Addr::LOCALHOST.to_string(), port),
            note: "fast localhost",
        },
        CandidateUrl {
            url: index_url(&local_ip.to_string(), port),
            note: "for network access",
        },
    ]
}

pub fn index_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}/index.html")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lists_local_and_network_urls() {
        let urls = candidate_urls(9500, Ipv4Addr::new(192, 168, 1, 20));
        let urls: Vec<_> = urls.iter().map(ToString::to_string).collect();
        assert_eq!(
            urls,
            [
                "http://localhost:9500/index.html  (for PWA install)",
                "http://127.0.0.1:9500/index.html  (fast localhost)",
                "http://192.168.1.20:9500/index.html  (for network access)",
            ]
        );
    }
}
