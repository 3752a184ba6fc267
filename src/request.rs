//! Incoming HTTP request type.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Uri;

use crate::context::{RequestContext, keys};
use crate::method::Method;
use crate::router::Params;

/// An incoming HTTP request with its body fully buffered.
///
/// Each request carries its own [`RequestContext`]; middleware write into it
/// and the terminal handler reads from it.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) context: RequestContext,
}

impl Request {
    pub(crate) fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, uri, headers, body, context: RequestContext::new() }
    }

    /// Builder for requests constructed in-process, e.g. in tests.
    ///
    /// ```rust
    /// use steep::{Method, Request};
    ///
    /// let req = Request::builder(Method::Post, "/todos")
    ///     .header("content-type", "application/vnd.api+json")
    ///     .body(r#"{"data":{"text":"tea"}}"#);
    /// assert_eq!(req.path(), "/todos");
    /// ```
    pub fn builder(method: Method, uri: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            uri: uri.parse().unwrap_or_else(|_| Uri::from_static("/")),
            headers: HeaderMap::new(),
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn context(&self) -> &RequestContext { &self.context }

    /// Header value as text. Header names are case-insensitive; values that
    /// are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter captured by the router.
    ///
    /// For a route `/todos/:id`, `req.param("id")` on `/todos/42` is `"42"`.
    pub fn param(&self, name: &str) -> Option<String> {
        self.context
            .get::<Params>(keys::PARAMS)
            .and_then(|p| p.get(name).map(str::to_owned))
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder`].
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestBuilder {
    /// Adds a header. Invalid names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Terminate with a body.
    pub fn body(self, body: impl Into<Bytes>) -> Request {
        Request::new(self.method, self.uri, self.headers, body.into())
    }

    /// Terminate with an empty body.
    pub fn empty(self) -> Request {
        self.body(Bytes::new())
    }
}
