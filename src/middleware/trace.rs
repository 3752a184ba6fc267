//! Per-request access log line.

use std::time::Instant;

use tracing::{info, warn};

use super::Middleware;
use crate::request::Request;

/// Logs method, path, status, and latency once the inner chain has answered.
pub fn trace() -> Middleware {
    Middleware::from_fn("trace", |req: Request, next| async move {
        let method = req.method();
        let path = req.uri().to_string();
        let started = Instant::now();

        let res = next.run(req).await;

        let status = res.status_code().as_u16();
        let elapsed = started.elapsed();
        if res.status_code().is_server_error() {
            warn!(%method, %path, status, ?elapsed, "request failed");
        } else {
            info!(%method, %path, status, ?elapsed, "request");
        }
        res
    })
}
