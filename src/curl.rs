//! Rendering of outgoing requests as equivalent curl commands.
//!
//! Used in debug mode to annotate failures with something that can be pasted
//! into a shell to reproduce the request.

use http::{header, HeaderMap, Method};
use url::Url;

/// Renders a request as a curl command line.
///
/// The output has the shape
/// `curl -X 'METHOD' -d 'BODY' -H 'Name: value' ... 'URL'`. Headers are listed
/// in name order; `-d` is omitted for an empty body; `--compressed` is added
/// when the request advertises an `Accept-Encoding`. Non UTF-8 body bytes are
/// replaced.
///
/// ```
/// use http::{HeaderMap, Method};
/// use url::Url;
///
/// let url = Url::parse("http://localhost:8080/qwe?a=1").unwrap();
/// let mut headers = HeaderMap::new();
/// headers.insert("accept", "application/json".parse().unwrap());
///
/// let curl = wirecall::curl::render(&Method::POST, &url, &headers, br#"{"it's":1}"#);
/// assert_eq!(
///     curl,
///     r#"curl -X 'POST' -d '{"it'\''s":1}' -H 'accept: application/json' 'http://localhost:8080/qwe?a=1'"#
/// );
/// ```
pub fn render(method: &Method, url: &Url, headers: &HeaderMap, body: &[u8]) -> String {
    let mut parts = vec!["curl".to_string(), "-X".to_string(), quote(method.as_str())];

    if !body.is_empty() {
        parts.push("-d".to_string());
        parts.push(quote(&String::from_utf8_lossy(body)));
    }

    let mut names: Vec<&str> = headers.keys().map(|name| name.as_str()).collect();
    names.sort_unstable();
    for name in names {
        for value in headers.get_all(name) {
            let value = String::from_utf8_lossy(value.as_bytes());
            parts.push("-H".to_string());
            parts.push(quote(&format!("{}: {}", name, value)));
        }
    }

    if headers.contains_key(header::ACCEPT_ENCODING) {
        parts.push("--compressed".to_string());
    }

    parts.push(quote(url.as_str()));
    parts.join(" ")
}

/// Wraps `s` in single quotes for a POSIX shell.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
