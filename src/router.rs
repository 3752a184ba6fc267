//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Patterns use `:name` for
//! a single captured segment and a trailing `*name` for the rest of the path.
//! A literal segment always wins over a capture at the same position, so
//! `/todos/new` and `/todos/:id` can coexist.
//!
//! Matching runs on the raw path; captured values are percent-decoded. A
//! capture that does not decode to UTF-8 matches nothing.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::{InsertError, Router as MatchitRouter};
use tracing::debug;

use crate::context::keys;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::jsonapi::ApiError;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Path parameters captured for one request, in pattern order.
///
/// The router stores them in the request context under
/// [`keys::PARAMS`] before the pipeline runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

/// The application router.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve),
/// or call [`dispatch`](Router::dispatch) directly.
///
/// ```rust,no_run
/// # use steep::{Chain, Method, Request, Response, Router};
/// # use steep::middleware::{clear_context, recover, trace};
/// # async fn show(_: Request) -> Response { Response::text("") }
/// # async fn index(_: Request) -> Response { Response::text("") }
/// # fn main() -> Result<(), steep::Error> {
/// let common = Chain::new([recover(), clear_context(), trace()])?;
///
/// Router::new()
///     .try_on(Method::Get, "/todos",     common.then(index))?
///     .try_on(Method::Get, "/todos/:id", common.then(show))?;
/// # Ok(())
/// # }
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or already registered for `method`.
    /// Use [`try_on`](Router::try_on) to handle that as an error instead.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.try_on(method, pattern, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Registers a handler for a method + pattern pair.
    pub fn try_on(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<Self, Error> {
        let path = translate(pattern)?;
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .map_err(|e| match e {
                InsertError::Conflict { with } => Error::DuplicateRoute {
                    method,
                    path: pattern.to_owned(),
                    reason: format!("conflicts with `{with}`"),
                },
                other => Error::InvalidRoute { path: pattern.to_owned(), reason: other.to_string() },
            })?;
        debug!(%method, pattern, "route registered");
        Ok(self)
    }

    /// Handler for requests that match no route, e.g. a static file server.
    /// Without one, unmatched requests get a `not_found` error document.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    /// Routes one request and produces its response.
    ///
    /// Captured parameters are stored in the request's context before the
    /// matched pipeline runs.
    pub async fn dispatch(&self, req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.context().set(keys::PARAMS, params);
                handler.call(req).await
            }
            None => match &self.fallback {
                Some(fallback) => fallback.call(req).await,
                None => ApiError::NOT_FOUND.into_response(),
            },
        }
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, Params)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| Some((k.to_owned(), urlencoding::decode(v).ok()?.into_owned())))
            .collect::<Option<Vec<_>>>()?;
        Some((handler, Params(params)))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Rewrites `:name` / `*name` segments into the radix tree's `{name}` /
/// `{*name}` syntax.
fn translate(pattern: &str) -> Result<String, Error> {
    let invalid = |reason: &str| Error::InvalidRoute {
        path: pattern.to_owned(),
        reason: reason.to_owned(),
    };

    let rest = pattern
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with `/`"))?;

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    let mut out = String::with_capacity(pattern.len() + 4);

    for (i, segment) in segments.iter().enumerate() {
        out.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            out.push('{');
            out.push_str(name);
            out.push('}');
        } else if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() || i != last {
                return Err(invalid("catch-all must be a named final segment"));
            }
            out.push_str("{*");
            out.push_str(name);
            out.push('}');
        } else {
            out.push_str(&segment.replace('{', "{{").replace('}', "}}"));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    async fn echo_params(req: Request) -> Response {
        let params = req.context().get::<Params>(keys::PARAMS).unwrap_or_default();
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Response::text(rendered.join("&"))
    }

    async fn body_of(router: &Router, method: Method, path: &str) -> (StatusCode, String) {
        let res = router.dispatch(Request::builder(method, path).empty()).await;
        (res.status_code(), String::from_utf8(res.body().to_vec()).unwrap())
    }

    #[test]
    fn translates_patterns() {
        assert_eq!(translate("/").unwrap(), "/");
        assert_eq!(translate("/todos/:id").unwrap(), "/todos/{id}");
        assert_eq!(translate("/files/*path").unwrap(), "/files/{*path}");
        assert!(translate("todos").is_err());
        assert!(translate("/todos/:").is_err());
        assert!(translate("/*all/tail").is_err());
    }

    #[tokio::test]
    async fn captures_named_segments() {
        let router = Router::new().on(Method::Get, "/teas/:id", echo_params);
        assert_eq!(
            body_of(&router, Method::Get, "/teas/42").await,
            (StatusCode::OK, "id=42".to_owned())
        );
    }

    #[tokio::test]
    async fn captures_are_percent_decoded() {
        let router = Router::new()
            .on(Method::Get, "/teas/:id", echo_params)
            .on(Method::Get, "/files/*path", echo_params);

        assert_eq!(body_of(&router, Method::Get, "/teas/earl%20grey").await.1, "id=earl grey");
        assert_eq!(body_of(&router, Method::Get, "/files/a%2Fb/c").await.1, "path=a/b/c");
        assert_eq!(body_of(&router, Method::Get, "/teas/%FF").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn literal_beats_capture() {
        let router = Router::new()
            .on(Method::Get, "/todos/:id", echo_params)
            .on(Method::Get, "/todos/done", |_req: Request| async { "literal" });

        assert_eq!(body_of(&router, Method::Get, "/todos/done").await.1, "literal");
        assert_eq!(body_of(&router, Method::Get, "/todos/7").await.1, "id=7");
    }

    #[tokio::test]
    async fn unmatched_path_or_method_is_not_found() {
        let router = Router::new().on(Method::Get, "/todos", |_req: Request| async { "list" });

        let (status, body) = body_of(&router, Method::Get, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains(r#""id":"not_found""#));

        assert_eq!(body_of(&router, Method::Delete, "/todos").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fallback_handles_misses() {
        let router = Router::new()
            .on(Method::Get, "/todos", |_req: Request| async { "list" })
            .fallback(|req: Request| async move { format!("static {}", req.path()) });

        assert_eq!(body_of(&router, Method::Get, "/app.js").await.1, "static /app.js");
        assert_eq!(body_of(&router, Method::Get, "/todos").await.1, "list");
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let err = Router::new()
            .try_on(Method::Get, "/todos/:id", echo_params)
            .unwrap()
            .try_on(Method::Get, "/todos/:id", echo_params)
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateRoute { method: Method::Get, .. }));

        // Same pattern on another method is fine.
        assert!(Router::new()
            .try_on(Method::Get, "/todos/:id", echo_params)
            .unwrap()
            .try_on(Method::Put, "/todos/:id", echo_params)
            .is_ok());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn on_panics_on_duplicates() {
        let _ = Router::new()
            .on(Method::Get, "/", echo_params)
            .on(Method::Get, "/", echo_params);
    }
}
