//! Embedded web assets using rust-embed
//!
//! The browser-side negotiator page is embedded directly into the
//! binary so the demo runs from a single executable.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use rust_embed::RustEmbed;

/// Embedded web UI assets
#[derive(RustEmbed)]
#[folder = "web/static"]
pub struct WebAssets;

/// Get an embedded file and return it as an Axum response
pub fn get_embedded_file(path: &str) -> Response {
    // Normalize path: remove leading slash, default to index.html
    let path = path.trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .header(header::CACHE_CONTROL, cache_control_for_path(path))
                .body(Body::from(content.data.into_owned()))
                .unwrap_or_else(|_| Response::new(Body::empty()))
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not found"))
            .unwrap_or_else(|_| Response::new(Body::empty())),
    }
}

/// Determine cache control header based on file type
fn cache_control_for_path(path: &str) -> &'static str {
    if path == "index.html" {
        "no-store, max-age=0"
    } else if path.ends_with(".js") || path.ends_with(".css") {
        "no-cache, max-age=0"
    } else {
        "public, max-age=3600"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_page_is_embedded() {
        assert!(WebAssets::get("index.html").is_some());
    }

    #[test]
    fn missing_file_returns_not_found() {
        let response = get_embedded_file("/no-such-file.bin");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
