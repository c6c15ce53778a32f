//! Trailing-slash redirects for directory-style routes.

use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};

/// `301` to the same path with a `/` appended. The query string is kept.
pub fn with_trailing_slash(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Handler form of [`with_trailing_slash`].
pub async fn add_trailing_slash(uri: Uri) -> Response {
    with_trailing_slash(&uri)
}
