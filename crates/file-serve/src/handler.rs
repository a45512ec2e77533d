use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use tiny_http::{Header, Method, Request, Response};

const NOT_FOUND: &str = "<h1> <center> 404: Page not found </center> </h1>";
const NOT_IMPLEMENTED: &str = "<h1> <center> 501: Unsupported method </center> </h1>";

/// What a request resolves to on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    File(PathBuf),
    /// A directory asked for without its trailing slash
    Redirect(String),
    NotFound,
}

pub(crate) fn static_file_handler(root: &Path, req: Request) -> io::Result<()> {
    match req.method() {
        Method::Get | Method::Head => {}
        _ => {
            let response = Response::from_data(NOT_IMPLEMENTED)
                .with_status_code(501)
                .with_header(html());
            return req.respond(response);
        }
    }

    match resolve(root, req.url()) {
        Target::File(path) => {
            let file = match std::fs::File::open(&path) {
                Ok(file) => file,
                // Raced with a removal, or unreadable
                Err(_) => return not_found(req),
            };
            let mime = mime_guess::MimeGuess::from_path(&path)
                .first_raw()
                .unwrap_or("application/octet-stream");
            let mut response = Response::from_file(file);
            if let Some(content_type) = header("Content-Type", mime) {
                response.add_header(content_type);
            }
            req.respond(response)
        }
        Target::Redirect(location) => {
            let mut response = Response::empty(301);
            if let Some(location) = header("Location", &location) {
                response.add_header(location);
            }
            req.respond(response)
        }
        Target::NotFound => not_found(req),
    }
}

fn not_found(req: Request) -> io::Result<()> {
    let response = Response::from_data(NOT_FOUND)
        .with_status_code(404)
        .with_header(html());
    req.respond(response)
}

fn html() -> Header {
    Header::from_str("Content-Type: text/html; charset=utf-8").expect("formatted correctly")
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Map a request URL onto the served directory
pub(crate) fn resolve(root: &Path, url: &str) -> Target {
    // querystrings are often used for cachebusting, keep them off the path
    let (url_path, query) = match url.find(['?', '#']) {
        Some(position) => url.split_at(position),
        None => (url, ""),
    };
    let query = if query.starts_with('?') { query } else { "" };

    let parts = segments(url_path);
    let path = root.join(parts.iter().collect::<PathBuf>());
    if path.is_dir() {
        if !url_path.ends_with('/') {
            let mut location = String::from("/");
            for segment in &parts {
                location.push_str(&urlencoding::encode(segment));
                location.push('/');
            }
            location.push_str(query);
            return Target::Redirect(location);
        }
        let index = path.join("index.html");
        if index.is_file() {
            Target::File(index)
        } else {
            Target::NotFound
        }
    } else if path.is_file() {
        Target::File(path)
    } else {
        Target::NotFound
    }
}

/// Decode the URL path into its segments, dropping anything that could
/// step outside of the root (`..`, `.`, empty segments, drive prefixes,
/// embedded separators)
fn segments(url_path: &str) -> Vec<String> {
    let decoded = urlencoding::decode(url_path).unwrap_or(Cow::Borrowed(url_path));
    decoded
        .split('/')
        .filter(|segment| {
            let mut components = Path::new(segment).components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        })
        .map(str::to_owned)
        .collect()
}
