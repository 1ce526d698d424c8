//! Static file server over the output root.

mod lifecycle;
mod listing;
mod path;
mod response;

pub use lifecycle::serve_wiki;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Method, Request, Server};

use self::path::Resolved;
use crate::core::LifecycleTx;
use crate::{debug, log};

/// Worker threads answering requests.
const REQUEST_THREADS: usize = 4;

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

/// Bind the HTTP server without starting the request loop.
///
/// The address is fixed: a port in use is an error, not a retry.
pub fn bind_server(addr: SocketAddr) -> Result<BoundServer> {
    let server = Server::http(addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;
    // Port 0 binds an ephemeral port; report the real one
    let addr = server.server_addr().to_ip().unwrap_or(addr);
    Ok(BoundServer {
        server: Arc::new(server),
        addr,
    })
}

impl BoundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop on its own thread.
    ///
    /// Failures after binding go to the lifecycle controller as fatal.
    pub fn spawn(self, root: &Path, lifecycle: LifecycleTx) -> ServerHandle {
        let server = Arc::clone(&self.server);
        let root = root.to_path_buf();
        let thread = thread::spawn(move || {
            if let Err(e) = run_request_loop(&server, root) {
                lifecycle.fatal(e);
            }
        });

        ServerHandle {
            server: self.server,
            thread,
        }
    }
}

/// Running server; `shutdown` stops accepting and joins the loop thread.
pub struct ServerHandle {
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) {
        self.server.unblock();
        if self.thread.join().is_err() {
            debug!("serve"; "request loop panicked");
        }
    }
}

fn run_request_loop(server: &Server, root: PathBuf) -> Result<()> {
    let root = Arc::new(
        root.canonicalize()
            .with_context(|| format!("cannot serve {}", root.display()))?,
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("mdwiki-http-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    // Ends once the server is unblocked
    for request in server.incoming_requests() {
        let root = Arc::clone(&root);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &root) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        debug!("serve"; "{} {} -> 405", request.method(), request.url());
        return response::respond_method_not_allowed(request);
    }

    match path::resolve_path(request.url(), root) {
        Some(Resolved::File(file)) => response::respond_file(request, &file),
        Some(Resolved::Listing(dir)) => {
            let html = listing::render_listing(&dir)
                .with_context(|| format!("failed to list {}", dir.display()))?;
            response::respond_listing(request, html)
        }
        Some(Resolved::Redirect(location)) => response::respond_redirect(request, &location),
        None => {
            debug!("serve"; "{} -> 404", request.url());
            response::respond_not_found(request)
        }
    }
}
