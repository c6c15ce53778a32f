//! Outbound request rewriting.
//!
//! # Responsibilities
//! - Compose the upstream URI from the base URL and the inbound path
//! - Record the client-visible host in `X-Forwarded-Host`
//! - Replace `Host` with the upstream authority
//! - Append the client IP to `X-Forwarded-For`
//! - Strip hop-by-hop headers
//! - Decide whether the client asked for an event stream
//!
//! Every function here is pure: the handler calls them explicitly.

use std::str::FromStr;

use axum::http::{
    header::{self, HeaderName},
    request::Parts,
    uri::{Authority, PathAndQuery, Scheme},
    HeaderMap, HeaderValue, Request, Uri,
};
use url::Url;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

pub const EVENT_STREAM: &str = "text/event-stream";

/// Headers that only describe the current hop.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Error building an [`Upstream`] from a base URL.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),

    #[error("upstream url has no host")]
    MissingHost,

    #[error("invalid upstream authority: {0}")]
    Authority(#[from] axum::http::uri::InvalidUri),

    #[error("upstream authority is not a valid Host header")]
    HostHeader(#[from] axum::http::header::InvalidHeaderValue),
}

/// The single fixed target of the proxy.
#[derive(Debug, Clone)]
pub struct Upstream {
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
    base_path: String,
    base_query: Option<String>,
}

impl Upstream {
    /// Parse an upstream base URL such as `http://localhost:11434`.
    pub fn parse(raw: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(raw)?;
        let host = url.host_str().ok_or(UpstreamError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)?;
        let scheme = Scheme::from_str(url.scheme())?;
        let host_header = HeaderValue::from_str(authority.as_str())?;

        Ok(Self {
            scheme,
            authority,
            host_header,
            base_path: url.path().to_string(),
            base_query: url.query().map(str::to_string),
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Target URI for an inbound request URI.
    pub fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, inbound.path());
        let query = match (self.base_query.as_deref(), inbound.query()) {
            (Some(base), Some(req)) if !base.is_empty() && !req.is_empty() => {
                Some(format!("{}&{}", base, req))
            }
            (Some(base), None) | (Some(base), Some("")) => Some(base.to_string()),
            (None, Some(req)) | (Some(""), Some(req)) => Some(req.to_string()),
            _ => None,
        };
        let path_and_query = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", path, q),
            _ => path,
        };

        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::from_str(&path_and_query)?)
            .build()?)
    }
}

/// Joins two path segments with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    let joined = match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    };
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// True when the client asked for a server-sent event stream.
pub fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .is_some_and(|accept| accept.as_bytes() == EVENT_STREAM.as_bytes())
}

/// Headers pre-set on the client response when streaming was requested.
pub fn prime_stream_headers(headers: &mut HeaderMap) {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
}

/// Removes hop-by-hop headers, including those listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_str(name.trim()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    let keep_trailers_te = headers
        .get(header::TE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case("trailers")));

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    if keep_trailers_te {
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
    }
}

/// Build the outbound request for the upstream.
pub fn rewrite<B>(
    parts: &Parts,
    body: B,
    upstream: &Upstream,
    client_ip: &str,
) -> Result<Request<B>, axum::http::Error> {
    let uri = upstream.target_uri(&parts.uri)?;
    let mut headers = parts.headers.clone();

    let original_host = parts
        .headers
        .get(header::HOST)
        .cloned()
        .or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
    match original_host {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST, host);
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }

    strip_hop_by_hop(&mut headers);

    headers.insert(header::HOST, upstream.host_header.clone());

    let forwarded_for = match parts
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
    {
        Some(prior) => format!("{}, {}", prior, client_ip),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert(X_FORWARDED_FOR, value);
    }

    let mut request = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .body(body)?;
    *request.headers_mut() = headers;
    Ok(request)
}
