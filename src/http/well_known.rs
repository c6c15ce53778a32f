//! Files under `<webroot>/.well-known`, served without credentials.
//!
//! Regular files go through `ServeDir`. A directory is answered with its
//! `index.html` when it has one and with a link listing otherwise. A
//! directory path without a trailing slash is redirected to one first.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tower_http::services::ServeDir;

use crate::http::redirect;

/// Route prefix, stripped before the path is resolved against the root.
pub const PREFIX: &str = "/.well-known";

/// Bytes escaped in listing links.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

#[derive(Debug, Clone)]
pub struct WellKnown {
    root: PathBuf,
}

impl WellKnown {
    pub fn new(webroot: &Path) -> Self {
        Self {
            root: webroot.join(".well-known"),
        }
    }

    /// Map a prefix-stripped request path onto the root.
    ///
    /// Returns `None` for anything that is not valid UTF-8 once decoded or
    /// that would climb out of the root.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(relative).decode_utf8().ok()?;
        let mut path = self.root.clone();
        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}

pub async fn serve_well_known(State(files): State<Arc<WellKnown>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();
    let relative = match path.strip_prefix(PREFIX) {
        Some("") | None => "/",
        Some(rest) => rest,
    };

    let Some(target) = files.resolve(relative) else {
        tracing::debug!(path = %path, "Rejected well-known path");
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Ok(meta) = tokio::fs::metadata(&target).await {
        if meta.is_dir() {
            if !path.ends_with('/') {
                return redirect::with_trailing_slash(request.uri());
            }
            let has_index = tokio::fs::try_exists(target.join("index.html"))
                .await
                .unwrap_or(false);
            if !has_index {
                return list_directory(&target).await;
            }
        }
    }

    serve_file(&files.root, request, relative).await
}

async fn serve_file(root: &Path, request: Request, relative: &str) -> Response {
    let (mut parts, body) = request.into_parts();
    let rewritten = match parts.uri.query() {
        Some(query) => format!("{relative}?{query}"),
        None => relative.to_owned(),
    };
    parts.uri = match rewritten.parse::<Uri>() {
        Ok(uri) => uri,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let mut files = ServeDir::new(root);
    match files.try_call(Request::from_parts(parts, body)).await {
        Ok(response) => response.map(Body::new),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serve well-known file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn list_directory(dir: &Path) -> Response {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "Failed to read directory");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|kind| kind.is_dir())
                    .unwrap_or(false);
                if is_dir {
                    name.push('/');
                }
                names.push(name);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "Failed to read directory");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }
    names.sort();

    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        render_listing(&names),
    )
        .into_response()
}

fn render_listing(names: &[String]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for name in names {
        let _ = writeln!(
            html,
            "<a href=\"{}\">{}</a>",
            utf8_percent_encode(name, HREF),
            escape_html(name)
        );
    }
    html.push_str("</pre>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_below_root() {
        let files = WellKnown::new(Path::new("/srv/www"));
        assert_eq!(
            files.resolve("/acme-challenge/tok"),
            Some(PathBuf::from("/srv/www/.well-known/acme-challenge/tok"))
        );
        assert_eq!(
            files.resolve("/"),
            Some(PathBuf::from("/srv/www/.well-known"))
        );
    }

    #[test]
    fn refuses_to_climb_out_of_root() {
        let files = WellKnown::new(Path::new("/srv/www"));
        assert_eq!(files.resolve("/../index.html"), None);
        assert_eq!(files.resolve("/acme-challenge/..%2f..%2fetc"), None);
        assert_eq!(files.resolve("/%ff"), None);
    }

    #[test]
    fn listing_links_every_entry_and_escapes_names() {
        let html = render_listing(&["a b<c>".to_string(), "acme-challenge/".to_string()]);
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<a href=\"a%20b%3Cc%3E\">a b&lt;c&gt;</a>\n"));
        assert!(html.contains("<a href=\"acme-challenge/\">acme-challenge/</a>\n"));
        assert!(html.ends_with("</pre>\n"));
    }
}
