//! Media-type negotiation.
//!
//! The API speaks exactly one media type. These guards reject requests that
//! cannot agree on it before any handler work happens.

use http::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use super::Middleware;
use crate::jsonapi::{ApiError, MEDIA_TYPE};
use crate::request::Request;
use crate::response::IntoResponse;

/// Rejects with `not_acceptable` unless `Accept` is the vendor media type or
/// `*/*`. A request without `Accept` accepts anything.
pub fn accept() -> Middleware {
    Middleware::from_fn("accept", |req: Request, next| async move {
        let accept = req.header(ACCEPT.as_str()).unwrap_or("*/*");
        if !accepts(accept) {
            debug!(accept, "rejecting request: unacceptable Accept header");
            return ApiError::NOT_ACCEPTABLE.into_response();
        }
        next.run(req).await
    })
}

/// Rejects with `unsupported_media_type` unless `Content-Type` is the vendor
/// media type (plain `application/json` is tolerated). A request without
/// `Content-Type` is rejected too.
pub fn content_type() -> Middleware {
    Middleware::from_fn("content_type", |req: Request, next| async move {
        let content_type = req.header(CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_supported_body(content_type) {
            debug!(content_type, "rejecting request: unsupported Content-Type");
            return ApiError::UNSUPPORTED_MEDIA_TYPE.into_response();
        }
        next.run(req).await
    })
}

fn essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or_default().trim()
}

fn accepts(header: &str) -> bool {
    header
        .split(',')
        .map(essence)
        .any(|m| m == "*/*" || m.eq_ignore_ascii_case(MEDIA_TYPE))
}

fn is_supported_body(header: &str) -> bool {
    let m = essence(header);
    m.eq_ignore_ascii_case(MEDIA_TYPE) || m.eq_ignore_ascii_case("application/json")
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::handler::{ErasedHandler, Handler};
    use crate::{Chain, Method};

    async fn run(mw: Middleware, req: Request) -> StatusCode {
        Chain::new([mw])
            .unwrap()
            .then(|_req: Request| async { StatusCode::NO_CONTENT })
            .into_boxed_handler()
            .call(req)
            .await
            .status_code()
    }

    #[test]
    fn accept_matching() {
        assert!(accepts("application/vnd.api+json"));
        assert!(accepts("*/*"));
        assert!(accepts("text/html, application/vnd.api+json;q=0.9"));
        assert!(!accepts("application/json"));
        assert!(!accepts(""));
    }

    #[test]
    fn content_type_matching() {
        assert!(is_supported_body("application/vnd.api+json"));
        assert!(is_supported_body("application/json; charset=utf-8"));
        assert!(!is_supported_body("text/plain"));
        assert!(!is_supported_body(""));
    }

    #[tokio::test]
    async fn accept_guard() {
        let ok = Request::builder(Method::Get, "/").header("accept", MEDIA_TYPE).empty();
        assert_eq!(run(accept(), ok).await, StatusCode::NO_CONTENT);

        let missing = Request::builder(Method::Get, "/").empty();
        assert_eq!(run(accept(), missing).await, StatusCode::NO_CONTENT);

        let html = Request::builder(Method::Get, "/").header("accept", "text/html").empty();
        assert_eq!(run(accept(), html).await, StatusCode::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn content_type_guard() {
        let ok = Request::builder(Method::Post, "/")
            .header("content-type", MEDIA_TYPE)
            .body("{}");
        assert_eq!(run(content_type(), ok).await, StatusCode::NO_CONTENT);

        let json = Request::builder(Method::Post, "/")
            .header("content-type", "application/json; charset=utf-8")
            .body("{}");
        assert_eq!(run(content_type(), json).await, StatusCode::NO_CONTENT);

        let missing = Request::builder(Method::Post, "/").body("{}");
        assert_eq!(run(content_type(), missing).await, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let form = Request::builder(Method::Post, "/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("a=1");
        assert_eq!(run(content_type(), form).await, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
