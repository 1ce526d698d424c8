//! HTTP response handlers.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{
    self,
    types::{HTML, PLAIN},
};

/// Respond with a static file; `HEAD` gets the headers only.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        let len = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        return send_head(request, 200, content_type, len);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with a generated directory listing.
pub fn respond_listing(request: Request, html: String) -> Result<()> {
    let body = html.into_bytes();
    if is_head_request(&request) {
        return send_head(request, 200, HTML, body.len() as u64);
    }
    send_body(request, 200, HTML, body)
}

/// Permanent redirect, used to add a directory's trailing slash.
pub fn respond_redirect(request: Request, location: &str) -> Result<()> {
    let response =
        Response::empty(StatusCode(301)).with_header(make_header("Location", location)?);
    request.respond(response)?;
    Ok(())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    let body = b"404 Not Found".to_vec();
    if is_head_request(&request) {
        return send_head(request, 404, PLAIN, body.len() as u64);
    }
    send_body(request, 404, PLAIN, body)
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN)?)
        .with_header(make_header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str, len: u64) -> Result<()> {
    let response = Response::new(
        StatusCode(status),
        vec![make_header("Content-Type", content_type)?],
        io::empty(),
        usize::try_from(len).ok(),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
